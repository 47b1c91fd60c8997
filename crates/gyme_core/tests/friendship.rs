use gyme_core::db::open_db_in_memory;
use gyme_core::rules::friendship;
use gyme_core::{
    ErrorKind, FriendAction, FriendStatus, FriendshipChange, FriendshipRejection, PageRequest,
    RepoError, ServiceError, SqliteUserRepository, User, UserId, UserRepository, UserService,
};
use proptest::prelude::*;
use rusqlite::Connection;
use std::collections::HashMap;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> UserService<SqliteUserRepository<'_>> {
    UserService::new(SqliteUserRepository::try_new(conn).unwrap())
}

fn register(service: &UserService<SqliteUserRepository<'_>>, user_name: &str) -> User {
    service.register_user(user_name, "First", "Last").unwrap()
}

fn edge_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM user_friends;", [], |row| row.get(0))
        .unwrap()
}

fn status(conn: &Connection, user_id: UserId, friend_id: UserId) -> Option<FriendStatus> {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .get_relation(user_id, friend_id)
        .unwrap()
        .map(|edge| edge.status)
}

fn assert_mirrored(conn: &Connection, a: UserId, b: UserId) {
    let forward = status(conn, a, b);
    let inverse = status(conn, b, a);
    assert_eq!(forward.map(FriendStatus::mirror), inverse);
}

#[test]
fn invite_then_accept_makes_mutual_friends() {
    let conn = setup();
    let users = service(&conn);
    let a = register(&users, "alice");
    let b = register(&users, "bob");

    let change = users.add_friend(a.id, b.id).unwrap();
    assert!(matches!(change, FriendshipChange::Create(_)));
    assert_eq!(status(&conn, a.id, b.id), Some(FriendStatus::InviteSent));
    assert_eq!(status(&conn, b.id, a.id), Some(FriendStatus::InviteReceived));

    users.accept_friend(b.id, a.id).unwrap();
    assert_eq!(status(&conn, a.id, b.id), Some(FriendStatus::Friend));
    assert_eq!(status(&conn, b.id, a.id), Some(FriendStatus::Friend));
    assert_eq!(edge_count(&conn), 2);
}

#[test]
fn request_back_accepts_pending_invite() {
    let conn = setup();
    let users = service(&conn);
    let a = register(&users, "alice");
    let b = register(&users, "bob");

    users.add_friend(a.id, b.id).unwrap();
    let change = users.add_friend(b.id, a.id).unwrap();
    assert!(matches!(change, FriendshipChange::Update { .. }));
    assert_eq!(status(&conn, a.id, b.id), Some(FriendStatus::Friend));
}

#[test]
fn self_friend_is_rejected_without_mutation() {
    let conn = setup();
    let users = service(&conn);
    let a = register(&users, "alice");

    let err = users.add_friend(a.id, a.id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Friendship(FriendshipRejection::SelfAction)
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(edge_count(&conn), 0);
}

#[test]
fn repeated_requests_and_removals_are_rejected_idempotently() {
    let conn = setup();
    let users = service(&conn);
    let a = register(&users, "alice");
    let b = register(&users, "bob");

    let err = users.remove_friend(a.id, b.id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Friendship(FriendshipRejection::NotFriends)
    ));
    assert_eq!(err.to_string(), "you don't have this friend");

    users.add_friend(a.id, b.id).unwrap();
    for _ in 0..2 {
        assert!(matches!(
            users.add_friend(a.id, b.id),
            Err(ServiceError::Friendship(FriendshipRejection::InviteAlreadySent))
        ));
    }
    users.accept_friend(b.id, a.id).unwrap();
    for _ in 0..2 {
        let err = users.add_friend(a.id, b.id).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Friendship(FriendshipRejection::AlreadyFriends)
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
    assert_eq!(edge_count(&conn), 2);
}

#[test]
fn accept_without_invite_is_rejected() {
    let conn = setup();
    let users = service(&conn);
    let a = register(&users, "alice");
    let b = register(&users, "bob");

    assert!(matches!(
        users.accept_friend(a.id, b.id),
        Err(ServiceError::Friendship(FriendshipRejection::NoPendingInvite))
    ));
    users.add_friend(a.id, b.id).unwrap();
    assert!(matches!(
        users.accept_friend(a.id, b.id),
        Err(ServiceError::Friendship(FriendshipRejection::NoPendingInvite))
    ));
}

#[test]
fn remove_deletes_both_edges_from_any_state() {
    let conn = setup();
    let users = service(&conn);
    let a = register(&users, "alice");
    let b = register(&users, "bob");

    users.add_friend(a.id, b.id).unwrap();
    users.remove_friend(b.id, a.id).unwrap();
    assert_eq!(edge_count(&conn), 0);

    users.add_friend(a.id, b.id).unwrap();
    users.accept_friend(b.id, a.id).unwrap();
    users.remove_friend(a.id, b.id).unwrap();
    assert_eq!(edge_count(&conn), 0);
}

#[test]
fn unknown_or_inactive_target_is_not_found() {
    let conn = setup();
    let users = service(&conn);
    let a = register(&users, "alice");
    let b = register(&users, "bob");
    conn.execute(
        "UPDATE users SET valid = 0 WHERE id = ?1;",
        [b.id.to_string()],
    )
    .unwrap();

    let missing = uuid::Uuid::new_v4();
    let err = users.add_friend(a.id, missing).unwrap_err();
    assert!(matches!(err, ServiceError::UserNotFound(id) if id == missing));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(
        users.add_friend(a.id, b.id),
        Err(ServiceError::UserNotFound(_))
    ));
}

fn arb_action() -> impl Strategy<Value = FriendAction> {
    prop_oneof![
        Just(FriendAction::Request),
        Just(FriendAction::Accept),
        Just(FriendAction::Remove),
    ]
}

/// Forward edges keyed by `(actor, target)` index into the registered users.
type Model = HashMap<(usize, usize), FriendStatus>;

/// Outcome a single action must produce: the actor's edge status after the
/// commit (`None` when the pair is deleted), or the rejection.
fn expected_outcome(
    model: &Model,
    actor: usize,
    target: usize,
    action: FriendAction,
) -> Result<Option<FriendStatus>, FriendshipRejection> {
    if actor == target {
        return Err(FriendshipRejection::SelfAction);
    }
    match (model.get(&(actor, target)).copied(), action) {
        (None, FriendAction::Request) => Ok(Some(FriendStatus::InviteSent)),
        (None, FriendAction::Accept) => Err(FriendshipRejection::NoPendingInvite),
        (None, FriendAction::Remove) => Err(FriendshipRejection::NotFriends),
        (Some(_), FriendAction::Remove) => Ok(None),
        (Some(FriendStatus::InviteReceived), _) => Ok(Some(FriendStatus::Friend)),
        (Some(FriendStatus::InviteSent), FriendAction::Request) => {
            Err(FriendshipRejection::InviteAlreadySent)
        }
        (Some(FriendStatus::InviteSent), FriendAction::Accept) => {
            Err(FriendshipRejection::NoPendingInvite)
        }
        (Some(FriendStatus::Friend), _) => Err(FriendshipRejection::AlreadyFriends),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_action_matches_the_state_machine_and_keeps_pairs_mirrored(
        steps in prop::collection::vec((0usize..3, 0usize..3, arb_action()), 0..24),
    ) {
        let conn = setup();
        let users = service(&conn);
        let people = ["ann", "ben", "cat"]
            .into_iter()
            .map(|name| register(&users, name))
            .collect::<Vec<_>>();
        let mut model = Model::new();

        for (actor, target, action) in steps {
            let expected = expected_outcome(&model, actor, target, action);
            let (actor_id, target_id) = (people[actor].id, people[target].id);
            let result = match action {
                FriendAction::Request => users.add_friend(actor_id, target_id),
                FriendAction::Accept => users.accept_friend(actor_id, target_id),
                FriendAction::Remove => users.remove_friend(actor_id, target_id),
            };

            match (expected, result) {
                (Ok(Some(status_after)), Ok(change)) => {
                    prop_assert!(!matches!(change, FriendshipChange::Delete(_)));
                    prop_assert_eq!(change.pair().forward.status, status_after);
                    model.insert((actor, target), status_after);
                    model.insert((target, actor), status_after.mirror());
                }
                (Ok(None), Ok(change)) => {
                    prop_assert!(matches!(change, FriendshipChange::Delete(_)));
                    model.remove(&(actor, target));
                    model.remove(&(target, actor));
                }
                (Err(rejection), Err(ServiceError::Friendship(actual))) => {
                    prop_assert_eq!(actual, rejection);
                }
                (expected, actual) => {
                    prop_assert!(
                        false,
                        "{:?} by {} -> {}: expected {:?}, got {:?}",
                        action,
                        actor,
                        target,
                        expected,
                        actual
                    );
                }
            }

            for (i, a) in people.iter().enumerate() {
                for (j, b) in people.iter().enumerate() {
                    if i != j {
                        prop_assert_eq!(status(&conn, a.id, b.id), model.get(&(i, j)).copied());
                        assert_mirrored(&conn, a.id, b.id);
                    }
                }
            }
        }
    }
}

#[test]
fn unknown_requester_is_not_found() {
    let conn = setup();
    let users = service(&conn);
    let b = register(&users, "bob");

    let missing = uuid::Uuid::new_v4();
    for result in [
        users.add_friend(missing, b.id),
        users.accept_friend(missing, b.id),
        users.remove_friend(missing, b.id),
    ] {
        let err = result.unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound(id) if id == missing));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
    assert_eq!(edge_count(&conn), 0);
}

#[test]
fn self_action_by_unknown_account_is_not_found() {
    let conn = setup();
    let users = service(&conn);

    let missing = uuid::Uuid::new_v4();
    let err = users.add_friend(missing, missing).unwrap_err();
    assert!(matches!(err, ServiceError::UserNotFound(id) if id == missing));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn edge_to_unknown_account_is_a_db_error_not_a_conflict() {
    let conn = setup();
    let users = service(&conn);
    let a = register(&users, "alice");
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let change = friendship::apply(a.id, uuid::Uuid::new_v4(), None, None, FriendAction::Request)
        .unwrap();
    let err = repo.commit_friendship(&change).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)), "{err:?}");
    assert_eq!(edge_count(&conn), 0);
}

#[test]
fn missing_mirror_is_reported_as_consistency_fault() {
    let conn = setup();
    let users = service(&conn);
    let a = register(&users, "alice");
    let b = register(&users, "bob");
    conn.execute(
        "INSERT INTO user_friends (user_id, friend_id, status) VALUES (?1, ?2, 'friend');",
        [a.id.to_string(), b.id.to_string()],
    )
    .unwrap();

    let err = users.remove_friend(a.id, b.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConsistencyFault);
    assert_eq!(edge_count(&conn), 1);
}

#[test]
fn friend_lists_are_filtered_by_status() {
    let conn = setup();
    let users = service(&conn);
    let a = register(&users, "alice");
    let b = register(&users, "bob");
    let c = register(&users, "carol");

    users.add_friend(a.id, b.id).unwrap();
    users.accept_friend(b.id, a.id).unwrap();
    users.add_friend(a.id, c.id).unwrap();

    let page = PageRequest::default();
    let friends = users.list_friends(a.id, FriendStatus::Friend, page).unwrap();
    assert_eq!(friends.iter().map(|u| u.id).collect::<Vec<_>>(), vec![b.id]);
    let sent = users
        .list_friends(a.id, FriendStatus::InviteSent, page)
        .unwrap();
    assert_eq!(sent.iter().map(|u| u.id).collect::<Vec<_>>(), vec![c.id]);
    let received = users
        .list_friends(c.id, FriendStatus::InviteReceived, page)
        .unwrap();
    assert_eq!(received.iter().map(|u| u.id).collect::<Vec<_>>(), vec![a.id]);
}

#[test]
fn common_friends_are_ranked_by_shared_count() {
    let conn = setup();
    let users = service(&conn);
    let me = register(&users, "me_user");
    let f1 = register(&users, "friend1");
    let f2 = register(&users, "friend2");
    let both = register(&users, "knows_both");
    let one = register(&users, "knows_one");

    let befriend = |x: &User, y: &User| {
        users.add_friend(x.id, y.id).unwrap();
        users.accept_friend(y.id, x.id).unwrap();
    };
    befriend(&me, &f1);
    befriend(&me, &f2);
    befriend(&f1, &both);
    befriend(&f2, &both);
    befriend(&f1, &one);
    befriend(&f1, &f2);

    let suggestions = users
        .common_friends(me.id, PageRequest::default())
        .unwrap();
    let ranked = suggestions
        .iter()
        .map(|item| (item.user.id, item.common_friends_count))
        .collect::<Vec<_>>();
    assert_eq!(ranked, vec![(both.id, 2), (one.id, 1)]);
}
