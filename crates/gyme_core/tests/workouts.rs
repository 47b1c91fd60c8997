use gyme_core::db::open_db_in_memory;
use gyme_core::{
    ErrorKind, Exercise, ExerciseService, ExerciseType, PageRequest, Series, ServiceError,
    SqliteExerciseRepository, SqliteUserRepository, SqliteWorkoutRepository, User,
    UserService, WorkoutService, WorkoutValidationError,
};
use rusqlite::Connection;

type Workouts<'conn> = WorkoutService<SqliteWorkoutRepository<'conn>, SqliteUserRepository<'conn>>;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn workout_service(conn: &Connection) -> Workouts<'_> {
    WorkoutService::new(
        SqliteWorkoutRepository::try_new(conn).unwrap(),
        SqliteUserRepository::try_new(conn).unwrap(),
    )
}

fn register(conn: &Connection, user_name: &str) -> User {
    UserService::new(SqliteUserRepository::try_new(conn).unwrap())
        .register_user(user_name, "First", "Last")
        .unwrap()
}

fn create_exercise(conn: &Connection, owner: &User, exercise_type: ExerciseType) -> Exercise {
    ExerciseService::new(
        SqliteExerciseRepository::try_new(conn).unwrap(),
        SqliteUserRepository::try_new(conn).unwrap(),
    )
    .create_exercise(owner.id, exercise_type, None)
    .unwrap()
}

#[test]
fn logged_workout_round_trips_with_summary() {
    let conn = setup();
    let service = workout_service(&conn);
    let owner = register(&conn, "lifter");
    let squat = create_exercise(&conn, &owner, ExerciseType::Squat);

    let logged = service
        .log_workout(
            owner.id,
            squat.id,
            1_700_000_000_000,
            vec![
                Series::new(5, 100.0),
                Series::new(5, 110.0),
                Series::new(3, 120.0),
            ],
            Some("  heavy day ".to_string()),
        )
        .unwrap();
    assert_eq!(logged.workout.description.as_deref(), Some("heavy day"));

    let loaded = service.get_workout(owner.id, logged.workout.id).unwrap();
    assert_eq!(loaded.workout, logged.workout);
    assert_eq!(loaded.summary.number_of_series, 3);
    assert_eq!(loaded.summary.number_of_repetitions, 13);
    assert!((loaded.summary.total_volume_kg - 1410.0).abs() < 1e-9);
    assert!((loaded.summary.average_weight_kg - 110.0).abs() < 1e-9);
    assert_eq!(loaded.summary.max_rep, Some(Series::new(3, 120.0)));
}

#[test]
fn only_the_owner_logs_and_edits() {
    let conn = setup();
    let service = workout_service(&conn);
    let owner = register(&conn, "lifter");
    let other = register(&conn, "watcher");
    let bench = create_exercise(&conn, &owner, ExerciseType::BenchPress);

    let err = service
        .log_workout(other.id, bench.id, 0, vec![Series::new(5, 60.0)], None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));

    let logged = service
        .log_workout(owner.id, bench.id, 0, vec![Series::new(5, 60.0)], None)
        .unwrap();
    assert!(matches!(
        service.update_workout(other.id, logged.workout.id, vec![Series::new(1, 1.0)], None),
        Err(ServiceError::Forbidden)
    ));
    assert!(matches!(
        service.remove_workout(other.id, logged.workout.id),
        Err(ServiceError::Forbidden)
    ));
}

#[test]
fn invalid_series_are_rejected() {
    let conn = setup();
    let service = workout_service(&conn);
    let owner = register(&conn, "lifter");
    let row = create_exercise(&conn, &owner, ExerciseType::BarbellRow);

    let err = service
        .log_workout(owner.id, row.id, 0, Vec::new(), None)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidWorkout(WorkoutValidationError::EmptySeries)
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = service
        .log_workout(
            owner.id,
            row.id,
            0,
            vec![Series::new(5, 40.0), Series::new(0, 40.0)],
            None,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidWorkout(WorkoutValidationError::ZeroRepetitions { index: 1 })
    ));

    let err = service
        .log_workout(owner.id, row.id, 0, vec![Series::new(5, f64::NAN)], None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn unknown_exercise_or_workout_is_not_found() {
    let conn = setup();
    let service = workout_service(&conn);
    let owner = register(&conn, "lifter");

    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        service.log_workout(owner.id, missing, 0, vec![Series::new(1, 1.0)], None),
        Err(ServiceError::ExerciseNotFound(_))
    ));
    assert!(matches!(
        service.get_workout(owner.id, missing),
        Err(ServiceError::WorkoutNotFound(_))
    ));
    assert!(matches!(
        service.remove_workout(owner.id, missing),
        Err(ServiceError::WorkoutNotFound(_))
    ));
}

#[test]
fn update_replaces_series_and_remove_deletes() {
    let conn = setup();
    let service = workout_service(&conn);
    let owner = register(&conn, "lifter");
    let curl = create_exercise(&conn, &owner, ExerciseType::BicepsCurl);

    let logged = service
        .log_workout(
            owner.id,
            curl.id,
            0,
            vec![Series::new(12, 10.0), Series::new(10, 12.0)],
            Some("first".to_string()),
        )
        .unwrap();
    let updated = service
        .update_workout(owner.id, logged.workout.id, vec![Series::new(8, 14.0)], None)
        .unwrap();
    assert_eq!(updated.summary.number_of_series, 1);

    let loaded = service.get_workout(owner.id, logged.workout.id).unwrap();
    assert_eq!(loaded.workout.series, vec![Series::new(8, 14.0)]);
    assert_eq!(loaded.workout.description, None);

    service.remove_workout(owner.id, logged.workout.id).unwrap();
    assert!(matches!(
        service.get_workout(owner.id, logged.workout.id),
        Err(ServiceError::WorkoutNotFound(_))
    ));
}

#[test]
fn list_is_newest_first_and_filterable() {
    let conn = setup();
    let service = workout_service(&conn);
    let owner = register(&conn, "lifter");
    let squat = create_exercise(&conn, &owner, ExerciseType::Squat);
    let dip = create_exercise(&conn, &owner, ExerciseType::Dip);

    for (exercise, performed_at) in [(&squat, 1_000), (&dip, 2_000), (&squat, 3_000)] {
        service
            .log_workout(
                owner.id,
                exercise.id,
                performed_at,
                vec![Series::new(5, 20.0)],
                None,
            )
            .unwrap();
    }

    let all = service
        .list_workouts(owner.id, owner.id, None, PageRequest::default())
        .unwrap();
    assert_eq!(
        all.iter().map(|d| d.workout.performed_at).collect::<Vec<_>>(),
        vec![3_000, 2_000, 1_000]
    );

    let squats = service
        .list_workouts(owner.id, owner.id, Some(squat.id), PageRequest::default())
        .unwrap();
    assert_eq!(squats.len(), 2);
    assert!(squats.iter().all(|d| d.workout.exercise_id == squat.id));
}

#[test]
fn private_workouts_hide_from_strangers() {
    let conn = setup();
    let service = workout_service(&conn);
    let owner = register(&conn, "lifter");
    let stranger = register(&conn, "stranger");
    let squat = create_exercise(&conn, &owner, ExerciseType::Squat);
    let logged = service
        .log_workout(owner.id, squat.id, 0, vec![Series::new(5, 80.0)], None)
        .unwrap();

    assert!(service.get_workout(stranger.id, logged.workout.id).is_ok());

    UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .set_private_account(owner.id, true)
        .unwrap();
    assert!(matches!(
        service.get_workout(stranger.id, logged.workout.id),
        Err(ServiceError::Forbidden)
    ));
    assert!(matches!(
        service.list_workouts(stranger.id, owner.id, None, PageRequest::default()),
        Err(ServiceError::Forbidden)
    ));
}
