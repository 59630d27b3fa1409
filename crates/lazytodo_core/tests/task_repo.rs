use lazytodo_core::{
    Clock, KeyValueStore, LoadError, MemoryStore, PersistError, StoreError, StoreResult, Task,
    TaskId, TaskList, TaskRepository, TASKS_STORAGE_KEY,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Clock frozen at one instant, so every id comes from collision handling.
struct FrozenClock(u64);

impl Clock for FrozenClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// Clock that moves one millisecond per read.
struct TickingClock(AtomicU64);

impl Clock for TickingClock {
    fn now_millis(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// Store whose writes always fail; counts attempts.
#[derive(Default)]
struct BrokenStore {
    writes: AtomicUsize,
}

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Backend("unreadable".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend("read-only".to_string()))
    }
}

fn repo() -> TaskRepository<Arc<MemoryStore>> {
    TaskRepository::with_clock(
        Arc::new(MemoryStore::new()),
        TickingClock(AtomicU64::new(1_700_000_000_000)),
    )
}

fn seeded(repo: &TaskRepository<Arc<MemoryStore>>, texts: &[&str]) -> TaskList {
    texts
        .iter()
        .fold(TaskList::new(), |list, text| repo.add(list, text))
}

fn persisted(repo: &TaskRepository<Arc<MemoryStore>>) -> Option<String> {
    repo.store().get(TASKS_STORAGE_KEY).unwrap()
}

#[test]
fn load_from_empty_store_returns_empty_list() {
    assert_eq!(repo().load().unwrap(), TaskList::new());
}

#[test]
fn load_treats_empty_value_as_absent() {
    let repo = repo();
    repo.store().set(TASKS_STORAGE_KEY, "").unwrap();
    assert!(repo.load().unwrap().is_empty());
}

#[test]
fn load_reports_corrupt_json_and_load_or_empty_falls_back() {
    let repo = repo();
    repo.store().set(TASKS_STORAGE_KEY, "{not json").unwrap();

    assert!(matches!(repo.load(), Err(LoadError::Corrupt(_))));
    assert!(repo.load_or_empty().is_empty());
}

#[test]
fn load_reports_store_failure() {
    let repo = TaskRepository::new(BrokenStore::default());
    assert!(matches!(repo.load(), Err(LoadError::Store(_))));
    assert!(repo.load_or_empty().is_empty());
}

#[test]
fn add_appends_open_task_with_trimmed_text() {
    let repo = repo();
    let list = seeded(&repo, &["first"]);

    let list = repo.add(list, "  second  ");
    assert_eq!(list.len(), 2);
    let last = list.last().unwrap();
    assert_eq!(last.text, "second");
    assert!(!last.completed);
    assert_eq!(list[0].text, "first");
}

#[test]
fn add_blank_text_is_noop_without_persist() {
    let repo = repo();
    let list = seeded(&repo, &["keep"]);
    let before = persisted(&repo);

    assert_eq!(repo.add(list.clone(), ""), list);
    assert_eq!(repo.add(list.clone(), "   "), list);
    assert_eq!(persisted(&repo), before);
}

#[test]
fn add_same_text_twice_yields_distinct_ids() {
    let repo = TaskRepository::new(MemoryStore::new());
    let list = repo.add(TaskList::new(), "A");
    let list = repo.add(list, "A");

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].text, "A");
    assert_eq!(list[1].text, "A");
    assert_ne!(list[0].id, list[1].id);
}

#[test]
fn ids_stay_unique_when_clock_is_frozen() {
    let repo = TaskRepository::with_clock(MemoryStore::new(), FrozenClock(5));
    let list = (0..20).fold(TaskList::new(), |list, index| {
        repo.add(list, &format!("task {index}"))
    });

    let ids = list.iter().map(|task| task.id.clone()).collect::<HashSet<_>>();
    assert_eq!(ids.len(), 20);
}

#[test]
fn ids_stay_unique_against_reloaded_list_after_clock_step_back() {
    let store = Arc::new(MemoryStore::new());
    let first = TaskRepository::with_clock(Arc::clone(&store), FrozenClock(1_000));
    first.add(TaskList::new(), "before restart");

    let second = TaskRepository::with_clock(Arc::clone(&store), FrozenClock(10));
    let list = second.load().unwrap();
    let list = second.add(list, "after restart");
    assert_ne!(list[0].id, list[1].id);
    assert_eq!(list[1].id, TaskId::new("1001"));
}

#[test]
fn id_at_numeric_limit_does_not_collide_on_add() {
    let repo = TaskRepository::with_clock(MemoryStore::new(), FrozenClock(1_700_000_000_000));
    let legacy = format!(r#"[{{"id":"{}","text":"a","completed":false}}]"#, u64::MAX);
    repo.store().set(TASKS_STORAGE_KEY, &legacy).unwrap();

    let list = repo.add(repo.load().unwrap(), "b");
    assert_eq!(list.len(), 2);
    assert_ne!(list[0].id, list[1].id);

    let reloaded = repo.load().unwrap();
    assert_eq!(reloaded, list);
}

#[test]
fn legacy_duplicate_ids_survive_load_and_next_persist() {
    let repo = repo();
    repo.store()
        .set(
            TASKS_STORAGE_KEY,
            r#"[
                {"id":"1","text":"first","completed":false},
                {"id":"1","text":"second","completed":true}
            ]"#,
        )
        .unwrap();

    let list = repo.load().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, TaskId::new("1"));
    assert_ne!(list[1].id, list[0].id);
    assert!(list[1].completed);

    let list = repo.add(list, "third");
    let stored = repo.load().unwrap();
    assert_eq!(stored, list);
    let texts = stored.iter().map(|task| task.text.as_str()).collect::<Vec<_>>();
    assert_eq!(texts, ["first", "second", "third"]);
    let ids = stored.iter().map(|task| task.id.clone()).collect::<HashSet<_>>();
    assert_eq!(ids.len(), 3);
}

#[test]
fn legacy_duplicate_ids_can_be_toggled_and_deleted_independently() {
    let repo = repo();
    repo.store()
        .set(
            TASKS_STORAGE_KEY,
            r#"[{"id":"7","text":"a"},{"id":"7","text":"b"}]"#,
        )
        .unwrap();

    let list = repo.load().unwrap();
    let second = list[1].id.clone();
    let list = repo.toggle_completion(list, &second);
    assert!(!list[0].completed);
    assert!(list[1].completed);

    let list = repo.delete(list, &TaskId::new("7"));
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].text, "b");
    assert_eq!(repo.load().unwrap(), list);
}

#[test]
fn legacy_untrimmed_text_loads_unchanged_and_roundtrips() {
    let repo = repo();
    repo.store()
        .set(
            TASKS_STORAGE_KEY,
            r#"[{"id":"1","text":"  Buy milk ","completed":false}]"#,
        )
        .unwrap();

    let list = repo.load().unwrap();
    assert_eq!(list[0].text, "  Buy milk ");

    let list = repo.toggle_completion(list, &TaskId::new("1"));
    let reloaded = repo.load().unwrap();
    assert_eq!(reloaded, list);
    assert_eq!(reloaded[0].text, "  Buy milk ");
    assert!(reloaded[0].completed);
}

#[test]
fn toggle_flips_only_the_target_and_is_an_involution() {
    let repo = repo();
    let list = seeded(&repo, &["a", "b", "c"]);
    let target = list[1].id.clone();

    let toggled = repo.toggle_completion(list.clone(), &target);
    assert!(toggled[1].completed);
    assert_eq!(toggled[0], list[0]);
    assert_eq!(toggled[2], list[2]);
    assert_eq!(toggled[1].id, list[1].id);
    assert_eq!(toggled[1].text, list[1].text);

    assert_eq!(repo.toggle_completion(toggled, &target), list);
}

#[test]
fn toggle_unknown_id_is_noop() {
    let repo = repo();
    let list = seeded(&repo, &["a"]);
    assert_eq!(repo.toggle_completion(list.clone(), &TaskId::new("missing")), list);
}

#[test]
fn delete_removes_target_and_keeps_order() {
    let repo = repo();
    let list = seeded(&repo, &["a", "b", "c"]);
    let target = list[1].id.clone();

    let remaining = repo.delete(list.clone(), &target);
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|task| task.id != target));
    assert_eq!(remaining, vec![list[0].clone(), list[2].clone()]);
}

#[test]
fn delete_unknown_id_is_noop() {
    let repo = repo();
    let list = seeded(&repo, &["a", "b"]);
    assert_eq!(repo.delete(list.clone(), &TaskId::new("missing")), list);
}

#[test]
fn persist_then_load_roundtrips() {
    let repo = repo();
    let mut list = seeded(&repo, &["a", "b"]);
    list[0].toggle();

    repo.persist(&list).unwrap();
    assert_eq!(repo.load().unwrap(), list);
}

#[test]
fn every_mutation_persists_latest_list() {
    let repo = repo();
    let list = seeded(&repo, &["a", "b"]);
    let list = repo.toggle_completion(list, &TaskId::new("1700000000000"));
    assert_eq!(repo.load().unwrap(), list);

    let list = repo.delete(list, &TaskId::new("1700000000001"));
    assert_eq!(repo.load().unwrap(), list);
}

#[test]
fn persisted_layout_is_plain_json_array() {
    let repo = TaskRepository::with_clock(MemoryStore::new(), FrozenClock(1_700_000_000_000));
    repo.add(TaskList::new(), "Buy milk");

    let raw = repo.store().get(TASKS_STORAGE_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        serde_json::json!([{"id": "1700000000000", "text": "Buy milk", "completed": false}])
    );
}

#[test]
fn persist_failure_keeps_in_memory_state() {
    let repo = TaskRepository::new(BrokenStore::default());
    let list = repo.add(TaskList::new(), "offline");
    assert_eq!(list.len(), 1);
    assert_eq!(repo.store().writes.load(Ordering::SeqCst), 1);

    assert!(matches!(repo.persist(&list), Err(PersistError::Store(_))));
}

#[test]
fn buy_milk_scenario() {
    let repo = TaskRepository::with_clock(MemoryStore::new(), FrozenClock(1_700_000_000_000));
    let list = repo.load().unwrap();
    assert!(list.is_empty());

    let list = repo.add(list, "Buy milk");
    let t1 = TaskId::new("1700000000000");
    assert_eq!(
        list,
        vec![Task {
            id: t1.clone(),
            text: "Buy milk".to_string(),
            completed: false,
        }]
    );

    let list = repo.toggle_completion(list, &t1);
    assert!(list[0].completed);

    let list = repo.delete(list, &t1);
    assert!(list.is_empty());
    assert!(repo.load().unwrap().is_empty());
}
