//! Property-based tests for the client reducer.
//!
//! Uses proptest to verify, over arbitrary action sequences:
//! 1. Replaying the same sequence from the initial state gives equal states.
//! 2. `reduce` never changes its input.
//! 3. `ClearDraft` is idempotent.
//! 4. Every task is stored under its own id and is pending exactly when
//!    its id is temporary.
//! 5. The ordered selector is sorted and covers every task.
//! 6. A page result from another load generation changes nothing.

use proptest::prelude::*;
use tasksync::reducer::reduce;
use tasksync::selectors;
use tasksync::{Action, State, TaskId, TaskPatch, TempId};
use tasksync_proto::cursor;
use tasksync_proto::task::{RecordId, TaskRecord};

// --- Strategies ---

/// Small pools so that actions often hit ids that are present.
fn arb_temp_id() -> impl Strategy<Value = TempId> {
    (0u8..4).prop_map(|n| TempId::new(format!("tmp-{n}")))
}

fn arb_record_id() -> impl Strategy<Value = RecordId> {
    (1u64..8).prop_map(RecordId::new)
}

fn arb_task_id() -> impl Strategy<Value = TaskId> {
    prop_oneof![
        arb_record_id().prop_map(TaskId::Permanent),
        arb_temp_id().prop_map(TaskId::Temporary),
    ]
}

fn arb_record() -> impl Strategy<Value = TaskRecord> {
    (arb_record_id(), "[a-z ]{0,8}", any::<bool>()).prop_map(|(id, text, is_complete)| {
        TaskRecord {
            id,
            text,
            is_complete,
        }
    })
}

/// Mostly current generations, so page results are often applied.
fn arb_generation() -> impl Strategy<Value = u64> {
    0u64..4
}

fn arb_list_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::RequestReload),
        Just(Action::RequestNextPage),
        (
            prop::collection::vec(arb_record(), 0..4),
            prop::option::of(arb_record_id().prop_map(cursor::encode)),
            arb_generation(),
        )
            .prop_map(|(items, cursor, generation)| Action::PageReceived {
                items,
                cursor,
                generation,
            }),
        ("[a-z ]{0,10}", arb_generation())
            .prop_map(|(message, generation)| Action::PageLoadFailed { message, generation }),
    ]
}

fn arb_task_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        "[a-z ]{0,10}".prop_map(|text| Action::EditDraft { text }),
        Just(Action::ClearDraft),
        arb_temp_id().prop_map(|temp_id| Action::BeginCreate { temp_id }),
        (arb_temp_id(), arb_record_id())
            .prop_map(|(temp_id, record_id)| Action::CreateConfirmed { temp_id, record_id }),
        arb_temp_id().prop_map(|temp_id| Action::CreateFailed {
            temp_id,
            message: String::new(),
        }),
        (
            arb_task_id(),
            prop::option::of("[a-z]{0,5}"),
            prop::option::of(any::<bool>()),
        )
            .prop_map(|(id, text, is_complete)| Action::EditTask {
                id,
                patch: TaskPatch { text, is_complete },
            }),
        arb_task_id().prop_map(|id| Action::DeleteTask { id }),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![1 => arb_list_action(), 2 => arb_task_action()]
}

fn replay(actions: &[Action]) -> State {
    actions
        .iter()
        .fold(State::default(), |state, action| reduce(&state, action))
}

// --- Properties ---

proptest! {
    #[test]
    fn replay_is_deterministic(actions in prop::collection::vec(arb_action(), 0..40)) {
        prop_assert_eq!(replay(&actions), replay(&actions));
    }

    #[test]
    fn reduce_leaves_input_unchanged(
        prefix in prop::collection::vec(arb_action(), 0..20),
        action in arb_action(),
    ) {
        let state = replay(&prefix);
        let snapshot = state.clone();
        let _ = reduce(&state, &action);
        prop_assert_eq!(state, snapshot);
    }

    #[test]
    fn clear_draft_is_idempotent(prefix in prop::collection::vec(arb_action(), 0..20)) {
        let once = reduce(&replay(&prefix), &Action::ClearDraft);
        let twice = reduce(&once, &Action::ClearDraft);
        prop_assert_eq!(once.draft.text.as_str(), "");
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn tasks_are_keyed_by_id_and_pending_iff_temporary(
        actions in prop::collection::vec(arb_action(), 0..40),
    ) {
        let state = replay(&actions);
        for (key, task) in state.task_list.items.iter() {
            prop_assert_eq!(key, &task.id);
            prop_assert_eq!(task.is_pending, task.id.is_temporary());
        }
    }

    #[test]
    fn ordered_tasks_is_sorted_and_complete(
        actions in prop::collection::vec(arb_action(), 0..40),
    ) {
        let state = replay(&actions);
        let ordered = selectors::ordered_tasks(&state);
        prop_assert_eq!(ordered.len(), state.task_list.items.len());
        prop_assert!(ordered.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn stale_page_results_are_ignored(
        prefix in prop::collection::vec(arb_action(), 0..20),
        items in prop::collection::vec(arb_record(), 0..4),
    ) {
        let state = replay(&prefix);
        let other = state.task_list.generation.wrapping_add(1);
        let received = Action::PageReceived { items, cursor: None, generation: other };
        let failed = Action::PageLoadFailed { message: "x".to_string(), generation: other };
        prop_assert_eq!(&reduce(&state, &received), &state);
        prop_assert_eq!(&reduce(&state, &failed), &state);
    }
}
