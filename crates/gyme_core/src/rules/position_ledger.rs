//! Owner-scoped exercise ordering.
//!
//! # Responsibility
//! - Compute placement of an inserted or moved exercise.
//! - Compute the minimal set of sibling position changes.
//!
//! # Invariants
//! - Given a dense `0..n` input, applying the returned shifts plus the subject
//!   placement yields a dense sequence again.
//! - Siblings strictly before the affected boundary never appear in shifts.
//! - Desired positions are always clamped, including for an empty list.

use crate::model::exercise::{Exercise, ExerciseId};

/// One sibling whose position must change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionShift {
    pub exercise_id: ExerciseId,
    pub from: i64,
    pub to: i64,
}

/// Final subject position and sibling changes for an insert or move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub position: i64,
    pub shifts: Vec<PositionShift>,
}

/// Places a new exercise among `siblings` at the desired rank.
///
/// Negative ranks clamp to `0`; ranks past the end append without shifting.
pub fn insert(desired: i64, siblings: &[Exercise]) -> Placement {
    let len = siblings.len() as i64;
    let position = desired.clamp(0, len);
    if position == len {
        return Placement {
            position,
            shifts: Vec::new(),
        };
    }

    let shifts = siblings
        .iter()
        .filter(|sibling| sibling.position >= position)
        .map(|sibling| PositionShift {
            exercise_id: sibling.id,
            from: sibling.position,
            to: sibling.position + 1,
        })
        .collect();

    Placement { position, shifts }
}

/// Closes the gap left by removing the exercise at `removed_position`.
///
/// `siblings` still contains the removed exercise. An out-of-range position
/// means the snapshot is already inconsistent; nothing is shifted.
pub fn remove(removed_position: i64, siblings: &[Exercise]) -> Vec<PositionShift> {
    if !in_range(removed_position, siblings.len()) {
        return Vec::new();
    }

    siblings
        .iter()
        .filter(|sibling| sibling.position > removed_position)
        .map(|sibling| PositionShift {
            exercise_id: sibling.id,
            from: sibling.position,
            to: sibling.position - 1,
        })
        .collect()
}

/// Moves `subject_id` to the desired rank within `siblings`.
///
/// `siblings` contains the subject. The gap at the old rank is closed before
/// the new rank is opened; changes that cancel out are not reported. A subject
/// missing from `siblings` is placed as a fresh insert.
pub fn move_to(subject_id: ExerciseId, desired: i64, siblings: &[Exercise]) -> Placement {
    let Some(subject) = siblings.iter().find(|sibling| sibling.id == subject_id) else {
        return insert(desired, siblings);
    };

    let old_position = in_range(subject.position, siblings.len()).then_some(subject.position);
    let others_len = siblings.len() as i64 - 1;
    let position = desired.clamp(0, others_len);

    let shifts = siblings
        .iter()
        .filter(|sibling| sibling.id != subject_id)
        .filter_map(|sibling| {
            let closed = match old_position {
                Some(old) if sibling.position > old => sibling.position - 1,
                _ => sibling.position,
            };
            let opened = if closed >= position { closed + 1 } else { closed };
            (opened != sibling.position).then_some(PositionShift {
                exercise_id: sibling.id,
                from: sibling.position,
                to: opened,
            })
        })
        .collect();

    Placement { position, shifts }
}

/// Applies shifts to an in-memory list.
pub fn apply_shifts(exercises: &mut [Exercise], shifts: &[PositionShift]) {
    for shift in shifts {
        if let Some(exercise) = exercises
            .iter_mut()
            .find(|exercise| exercise.id == shift.exercise_id)
        {
            exercise.position = shift.to;
        }
    }
}

/// Returns whether positions are exactly `{0, 1, .., n-1}`.
pub fn is_dense(exercises: &[Exercise]) -> bool {
    let mut positions = exercises
        .iter()
        .map(|exercise| exercise.position)
        .collect::<Vec<_>>();
    positions.sort_unstable();
    positions
        .iter()
        .enumerate()
        .all(|(index, position)| *position == index as i64)
}

fn in_range(position: i64, len: usize) -> bool {
    position >= 0 && position < len as i64
}

#[cfg(test)]
mod tests {
    use super::{apply_shifts, insert, is_dense, move_to, remove};
    use crate::model::exercise::{Exercise, ExerciseType};
    use uuid::Uuid;

    fn owned_list(len: usize) -> Vec<Exercise> {
        let owner = Uuid::new_v4();
        ExerciseType::ALL
            .into_iter()
            .take(len)
            .enumerate()
            .map(|(index, kind)| Exercise::new(owner, kind, index as i64))
            .collect()
    }

    fn positions_by_id(list: &[Exercise]) -> Vec<i64> {
        list.iter().map(|exercise| exercise.position).collect()
    }

    #[test]
    fn insert_in_middle_shifts_tail() {
        let siblings = owned_list(3);
        let placement = insert(1, &siblings);
        assert_eq!(placement.position, 1);
        let moved = placement
            .shifts
            .iter()
            .map(|shift| (shift.from, shift.to))
            .collect::<Vec<_>>();
        assert_eq!(moved, vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn insert_clamps_negative_to_front() {
        let siblings = owned_list(3);
        let placement = insert(-5, &siblings);
        assert_eq!(placement.position, 0);
        assert_eq!(placement.shifts.len(), 3);
    }

    #[test]
    fn insert_past_end_appends_without_shifts() {
        let siblings = owned_list(3);
        let placement = insert(99, &siblings);
        assert_eq!(placement.position, 3);
        assert!(placement.shifts.is_empty());
    }

    #[test]
    fn insert_into_empty_list_always_clamps() {
        assert_eq!(insert(-3, &[]).position, 0);
        assert_eq!(insert(7, &[]).position, 0);
        assert!(insert(0, &[]).shifts.is_empty());
    }

    #[test]
    fn remove_shifts_only_later_siblings() {
        let siblings = owned_list(3);
        let shifts = remove(1, &siblings);
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].exercise_id, siblings[2].id);
        assert_eq!((shifts[0].from, shifts[0].to), (2, 1));
    }

    #[test]
    fn remove_out_of_range_is_a_no_op() {
        let siblings = owned_list(3);
        assert!(remove(3, &siblings).is_empty());
        assert!(remove(-1, &siblings).is_empty());
    }

    #[test]
    fn move_down_keeps_positions_dense() {
        let mut list = owned_list(4);
        let subject = list[1].id;
        let placement = move_to(subject, 3, &list);
        assert_eq!(placement.position, 3);
        apply_shifts(&mut list, &placement.shifts);
        list[1].position = placement.position;
        assert_eq!(positions_by_id(&list), vec![0, 3, 1, 2]);
        assert!(is_dense(&list));
    }

    #[test]
    fn move_up_keeps_positions_dense() {
        let mut list = owned_list(4);
        let subject = list[3].id;
        let placement = move_to(subject, 0, &list);
        apply_shifts(&mut list, &placement.shifts);
        list[3].position = placement.position;
        assert_eq!(positions_by_id(&list), vec![1, 2, 3, 0]);
        assert_eq!(placement.shifts.len(), 3);
    }

    #[test]
    fn move_to_same_slot_changes_nothing() {
        let list = owned_list(4);
        let placement = move_to(list[2].id, 2, &list);
        assert_eq!(placement.position, 2);
        assert!(placement.shifts.is_empty());
    }

    #[test]
    fn move_past_end_clamps_to_last_slot() {
        let list = owned_list(3);
        let placement = move_to(list[0].id, 42, &list);
        assert_eq!(placement.position, 2);
        assert_eq!(placement.shifts.len(), 2);
    }

    #[test]
    fn density_detects_gaps_and_duplicates() {
        let mut list = owned_list(3);
        assert!(is_dense(&list));
        list[2].position = 5;
        assert!(!is_dense(&list));
        list[2].position = 1;
        assert!(!is_dense(&list));
        assert!(is_dense(&[]));
    }
}
