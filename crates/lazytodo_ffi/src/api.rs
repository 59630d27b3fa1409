//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the task list store to Dart via FRB as snapshot-returning calls.
//! - Expose the navigator, delete dialog and remote posts screen models.
//! - Keep error semantics simple: every call returns an envelope.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - One process-wide task list store, opened lazily on first use.
//! - Persistence is write-behind; calls return before the disk write.

use lazytodo_core::screen::dialog::{ConfirmDialog, DialogAction, DialogPhase};
use lazytodo_core::screen::login_form::LoginForm;
use lazytodo_core::screen::navigator::{Navigator, Route};
use lazytodo_core::screen::remote_list::{
    HttpPostSource, PostSource, RemoteList, RemoteListState, FETCH_FAILED_MESSAGE,
};
use lazytodo_core::service::task_list_store::{DELETE_PROMPT_BODY, DELETE_PROMPT_TITLE};
use lazytodo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, SqliteStore, Task,
    TaskId, TaskIntent, TaskListSnapshot, TaskListStore, TaskRepository, WriteBehindStore,
};
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::Duration;

const TASK_DB_FILE_NAME: &str = "lazytodo_tasks.sqlite3";
const TASK_DB_PATH_ENV: &str = "LAZYTODO_DB_PATH";

type HostTaskStore = TaskListStore<WriteBehindStore<SqliteStore>>;

static TASK_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static TASK_STORE: Mutex<Option<HostTaskStore>> = Mutex::new(None);
static NAVIGATOR: OnceLock<Mutex<Navigator>> = OnceLock::new();
static DELETE_DIALOG: OnceLock<Mutex<ConfirmDialog>> = OnceLock::new();

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the task database location (usually the app documents directory).
///
/// # FFI contract
/// - Must run before the first task call; later calls with a different path
///   return an error message.
/// - Returns empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_task_db_path(path: String) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "task db path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = TASK_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "task db path already set to `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Task row returned to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

/// Snapshot envelope for every task call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    /// Whether the store could be reached.
    pub ok: bool,
    pub items: Vec<TaskItem>,
    /// Task awaiting delete confirmation, if any.
    pub pending_deletion: Option<TaskItem>,
    pub prompt_title: Option<String>,
    pub prompt_body: Option<String>,
    /// Human-readable diagnostics.
    pub message: String,
}

impl TaskListResponse {
    fn from_snapshot(snapshot: TaskListSnapshot) -> Self {
        let message = format!("{} task(s).", snapshot.tasks.len());
        Self {
            ok: true,
            items: snapshot.tasks.into_iter().map(to_task_item).collect(),
            pending_deletion: snapshot.pending_deletion.map(to_task_item),
            prompt_title: snapshot.prompt.as_ref().map(|p| p.title.to_string()),
            prompt_body: snapshot.prompt.as_ref().map(|p| p.body.to_string()),
            message,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            pending_deletion: None,
            prompt_title: None,
            prompt_body: None,
            message: message.into(),
        }
    }
}

/// Login form validation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormResponse {
    pub ok: bool,
    pub name_error: Option<String>,
    pub email_error: Option<String>,
    pub password_error: Option<String>,
}

/// Navigator state after a navigation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavResponse {
    pub ok: bool,
    /// Route name on top of the stack (`Home` or `Login`).
    pub route: String,
    pub title: String,
    pub right_action_label: Option<String>,
    pub right_action_target: Option<String>,
    pub depth: u32,
    pub message: String,
}

/// Delete confirmation dialog frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogResponse {
    /// One of `hidden|fading_in|visible|fading_out`.
    pub phase: String,
    pub opacity: f32,
    pub title: String,
    pub body: String,
}

/// Remote post row returned to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostItem {
    pub id: u64,
    pub title: String,
}

/// Result of one posts fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsResponse {
    pub ok: bool,
    pub items: Vec<PostItem>,
    /// Empty on success, the fixed user-facing failure text otherwise.
    pub message: String,
}

/// Mounts the list screen and returns the current snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_load() -> TaskListResponse {
    with_task_store("tasks_load", |store| store.mount())
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_add(text: String) -> TaskListResponse {
    dispatch("task_add", TaskIntent::Add { text })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(id: String) -> TaskListResponse {
    dispatch("task_toggle", TaskIntent::Toggle { id: TaskId::new(id) })
}

/// Deletes immediately, without confirmation.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> TaskListResponse {
    dispatch("task_delete", TaskIntent::Delete { id: TaskId::new(id) })
}

/// Long-press entry point: selects a task and exposes the confirm prompt.
#[flutter_rust_bridge::frb(sync)]
pub fn task_select_for_deletion(id: String) -> TaskListResponse {
    dispatch(
        "task_select_for_deletion",
        TaskIntent::SelectForDeletion { id: TaskId::new(id) },
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_confirm_deletion() -> TaskListResponse {
    dispatch("task_confirm_deletion", TaskIntent::ConfirmDeletion)
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_cancel_deletion() -> TaskListResponse {
    dispatch("task_cancel_deletion", TaskIntent::CancelDeletion)
}

/// Blocks until queued task writes reach disk (call on app pause).
///
/// # FFI contract
/// - Returns empty string on success, including when no store is open yet.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_flush() -> String {
    let guard = match TASK_STORE.lock() {
        Ok(guard) => guard,
        Err(_) => return "tasks_flush failed: task store lock poisoned".to_string(),
    };
    match guard.as_ref() {
        Some(store) => match store.repository().store().flush() {
            Ok(()) => String::new(),
            Err(err) => format!("tasks_flush failed: {err}"),
        },
        None => String::new(),
    }
}

/// Validates the login form; field values are not retained or logged.
#[flutter_rust_bridge::frb(sync)]
pub fn login_validate(name: String, email: String, password: String) -> FormResponse {
    match LoginForm::new(name, email, password).submit() {
        Ok(()) => FormResponse {
            ok: true,
            name_error: None,
            email_error: None,
            password_error: None,
        },
        Err(errors) => FormResponse {
            ok: false,
            name_error: errors.name.map(str::to_string),
            email_error: errors.email.map(str::to_string),
            password_error: errors.password.map(str::to_string),
        },
    }
}

/// Current navigator route and header.
#[flutter_rust_bridge::frb(sync)]
pub fn nav_current() -> NavResponse {
    with_navigator("nav_current", |_| Ok(()))
}

/// Navigates to `route` (`Home` or `Login`), popping back if already stacked.
#[flutter_rust_bridge::frb(sync)]
pub fn nav_navigate(route: String) -> NavResponse {
    with_navigator("nav_navigate", |navigator| {
        let target = Route::from_name(&route)
            .ok_or_else(|| format!("unknown route `{}`", route.trim()))?;
        navigator.navigate(target);
        Ok(())
    })
}

/// Pops one route; the root route stays in place.
#[flutter_rust_bridge::frb(sync)]
pub fn nav_back() -> NavResponse {
    with_navigator("nav_back", |navigator| {
        if navigator.go_back() {
            Ok(())
        } else {
            Err("already at root".to_string())
        }
    })
}

/// Advances the delete dialog animation by `elapsed_ms`.
///
/// The dialog fades in while a task is selected for deletion and fades out
/// once the selection is confirmed or cancelled. Call once per frame.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_dialog_tick(elapsed_ms: u32) -> DialogResponse {
    let selected = match TASK_STORE.lock() {
        Ok(guard) => guard
            .as_ref()
            .is_some_and(|store| store.snapshot().pending_deletion.is_some()),
        Err(_) => false,
    };
    let Some(mut dialog) = lock_dialog() else {
        error!("event=ffi_call module=ffi status=error call=delete_dialog_tick error=dialog_lock_poisoned");
        return DialogResponse::hidden();
    };
    dialog.set_visible(selected);
    dialog.advance(Duration::from_millis(u64::from(elapsed_ms)));
    DialogResponse::from_dialog(&dialog)
}

/// Dialog button press; ignored unless the dialog is on screen.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_dialog_respond(confirmed: bool) -> TaskListResponse {
    let action = match lock_dialog() {
        Some(dialog) if confirmed => dialog.confirm(),
        Some(dialog) => dialog.cancel(),
        None => {
            error!("event=ffi_call module=ffi status=error call=delete_dialog_respond error=dialog_lock_poisoned");
            return TaskListResponse::failure(
                "delete_dialog_respond failed: dialog lock poisoned",
            );
        }
    };
    match action {
        Some(DialogAction::Confirmed) => {
            dispatch("delete_dialog_respond", TaskIntent::ConfirmDeletion)
        }
        Some(DialogAction::Cancelled) => {
            dispatch("delete_dialog_respond", TaskIntent::CancelDeletion)
        }
        None => {
            debug!("event=ffi_call module=ffi status=skip call=delete_dialog_respond reason=dialog_hidden");
            with_task_store("delete_dialog_respond", |store| store.snapshot())
        }
    }
}

/// Fetches the remote posts list.
///
/// # FFI contract
/// - Async on the Dart side: blocks on network I/O for up to the fetch
///   timeout, so it runs on the FRB worker pool.
/// - Failures return `ok = false` with the fixed failure message.
pub fn posts_fetch() -> PostsResponse {
    match HttpPostSource::new() {
        Ok(source) => fetch_posts_from(&source),
        Err(err) => {
            error!("event=ffi_call module=ffi status=error call=posts_fetch error={err}");
            PostsResponse::failure(FETCH_FAILED_MESSAGE)
        }
    }
}

fn dispatch(call: &'static str, intent: TaskIntent) -> TaskListResponse {
    with_task_store(call, |store| store.dispatch(intent))
}

fn with_task_store(
    call: &'static str,
    f: impl FnOnce(&mut HostTaskStore) -> TaskListSnapshot,
) -> TaskListResponse {
    let mut guard = match TASK_STORE.lock() {
        Ok(guard) => guard,
        Err(_) => {
            error!("event=ffi_call module=ffi status=error call={call} error=store_lock_poisoned");
            return TaskListResponse::failure(format!("{call} failed: task store lock poisoned"));
        }
    };

    if guard.is_none() {
        match open_task_store() {
            Ok(store) => *guard = Some(store),
            Err(err) => {
                error!("event=ffi_call module=ffi status=error call={call} error={err}");
                return TaskListResponse::failure(format!("{call} failed: {err}"));
            }
        }
    }

    match guard.as_mut() {
        Some(store) => TaskListResponse::from_snapshot(f(store)),
        None => TaskListResponse::failure(format!("{call} failed: task store unavailable")),
    }
}

fn open_task_store() -> Result<HostTaskStore, String> {
    let path = resolve_task_db_path();
    let sqlite = SqliteStore::open(&path)
        .map_err(|err| format!("task DB open failed at `{}`: {err}", path.display()))?;
    let backing =
        WriteBehindStore::new(sqlite).map_err(|err| format!("task store init failed: {err}"))?;
    info!("event=task_store_open module=ffi status=ok");
    Ok(TaskListStore::new(TaskRepository::new(backing)))
}

fn resolve_task_db_path() -> PathBuf {
    TASK_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(TASK_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(TASK_DB_FILE_NAME)
        })
        .clone()
}

fn with_navigator(
    call: &'static str,
    f: impl FnOnce(&mut Navigator) -> Result<(), String>,
) -> NavResponse {
    let mut navigator = match NAVIGATOR
        .get_or_init(|| Mutex::new(Navigator::new()))
        .lock()
    {
        Ok(guard) => guard,
        Err(_) => {
            error!("event=ffi_call module=ffi status=error call={call} error=navigator_lock_poisoned");
            return NavResponse::from_navigator(
                &Navigator::new(),
                false,
                format!("{call} failed: navigator lock poisoned"),
            );
        }
    };
    match f(&mut navigator) {
        Ok(()) => NavResponse::from_navigator(&navigator, true, String::new()),
        Err(message) => {
            debug!("event=ffi_call module=ffi status=skip call={call} reason={message}");
            NavResponse::from_navigator(&navigator, false, format!("{call} failed: {message}"))
        }
    }
}

impl NavResponse {
    fn from_navigator(navigator: &Navigator, ok: bool, message: String) -> Self {
        let header = navigator.header();
        Self {
            ok,
            route: navigator.current().name().to_string(),
            title: header.title.to_string(),
            right_action_label: header.right_action.map(|action| action.label.to_string()),
            right_action_target: header
                .right_action
                .map(|action| action.target.name().to_string()),
            depth: u32::try_from(navigator.stack().len()).unwrap_or(u32::MAX),
            message,
        }
    }
}

fn lock_dialog() -> Option<MutexGuard<'static, ConfirmDialog>> {
    DELETE_DIALOG
        .get_or_init(|| Mutex::new(ConfirmDialog::new(DELETE_PROMPT_TITLE, DELETE_PROMPT_BODY)))
        .lock()
        .ok()
}

impl DialogResponse {
    fn from_dialog(dialog: &ConfirmDialog) -> Self {
        let phase = match dialog.phase() {
            DialogPhase::Hidden => "hidden",
            DialogPhase::FadingIn => "fading_in",
            DialogPhase::Visible => "visible",
            DialogPhase::FadingOut => "fading_out",
        };
        Self {
            phase: phase.to_string(),
            opacity: dialog.opacity(),
            title: dialog.title().to_string(),
            body: dialog.body().to_string(),
        }
    }

    fn hidden() -> Self {
        Self {
            phase: "hidden".to_string(),
            opacity: 0.0,
            title: DELETE_PROMPT_TITLE.to_string(),
            body: DELETE_PROMPT_BODY.to_string(),
        }
    }
}

fn fetch_posts_from(source: &dyn PostSource) -> PostsResponse {
    let mut list = RemoteList::new();
    match list.refresh(source) {
        RemoteListState::Loaded(posts) => PostsResponse {
            ok: true,
            items: posts
                .iter()
                .map(|post| PostItem {
                    id: post.id,
                    title: post.title.clone(),
                })
                .collect(),
            message: String::new(),
        },
        RemoteListState::Failed(message) => PostsResponse::failure(message.as_str()),
        RemoteListState::Loading => PostsResponse::failure(FETCH_FAILED_MESSAGE),
    }
}

impl PostsResponse {
    fn failure(message: &str) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            message: message.to_string(),
        }
    }
}

fn to_task_item(task: Task) -> TaskItem {
    TaskItem {
        id: task.id.to_string(),
        text: task.text,
        completed: task.completed,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_task_db_path, core_version, delete_dialog_respond, delete_dialog_tick,
        fetch_posts_from, init_logging, login_validate, nav_back, nav_current, nav_navigate,
        task_add, task_cancel_deletion, task_confirm_deletion, task_delete,
        task_select_for_deletion, task_toggle, tasks_flush, tasks_load, PostItem, TaskItem,
    };
    use lazytodo_core::screen::remote_list::{Post, PostSource, RemoteError};
    use std::sync::{Mutex, MutexGuard};
    use std::time::{SystemTime, UNIX_EPOCH};

    // Tests share one process-wide store and selection.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        let guard = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let path = std::env::temp_dir().join(format!(
            "lazytodo-ffi-test-{}.sqlite3",
            std::process::id()
        ));
        assert_eq!(configure_task_db_path(path.display().to_string()), "");
        guard
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }

    fn find(items: &[TaskItem], text: &str) -> Option<TaskItem> {
        items.iter().find(|item| item.text == text).cloned()
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn configure_rejects_switching_paths() {
        let _guard = serial();
        let message = configure_task_db_path("/somewhere/else.sqlite3".to_string());
        assert!(message.contains("refusing to switch"));
        assert!(!configure_task_db_path("   ".to_string()).is_empty());
    }

    #[test]
    fn add_toggle_delete_roundtrip() {
        let _guard = serial();
        assert!(tasks_load().ok);

        let text = unique_token("ffi-add");
        let added = task_add(format!("  {text}  "));
        assert!(added.ok, "{}", added.message);
        let item = find(&added.items, &text).expect("added task should be listed");
        assert!(!item.completed);

        let toggled = task_toggle(item.id.clone());
        assert!(find(&toggled.items, &text).unwrap().completed);

        let deleted = task_delete(item.id);
        assert!(find(&deleted.items, &text).is_none());
        assert_eq!(tasks_flush(), "");
    }

    #[test]
    fn blank_add_leaves_list_unchanged() {
        let _guard = serial();
        let before = tasks_load();
        let after = task_add("   ".to_string());
        assert_eq!(after.items, before.items);
    }

    #[test]
    fn select_then_confirm_or_cancel() {
        let _guard = serial();
        let text = unique_token("ffi-select");
        let added = task_add(text.clone());
        let item = find(&added.items, &text).unwrap();

        let selected = task_select_for_deletion(item.id.clone());
        assert_eq!(selected.pending_deletion.as_ref(), Some(&item));
        assert_eq!(selected.prompt_title.as_deref(), Some("Delete Task"));

        let cancelled = task_cancel_deletion();
        assert_eq!(cancelled.pending_deletion, None);
        assert!(find(&cancelled.items, &text).is_some());

        task_select_for_deletion(item.id);
        let confirmed = task_confirm_deletion();
        assert_eq!(confirmed.prompt_body, None);
        assert!(find(&confirmed.items, &text).is_none());
    }

    #[test]
    fn login_validate_reports_field_errors() {
        let response = login_validate(String::new(), "bad".to_string(), "123".to_string());
        assert!(!response.ok);
        assert_eq!(response.name_error.as_deref(), Some("Name is required"));
        assert_eq!(response.email_error.as_deref(), Some("Valid email is required"));
        assert!(response.password_error.is_some());

        assert!(login_validate("Ada".into(), "ada@example.com".into(), "secret1".into()).ok);
    }

    struct FixedPosts;

    impl PostSource for FixedPosts {
        fn fetch_posts(&self) -> Result<Vec<Post>, RemoteError> {
            Ok(vec![Post {
                id: 1,
                title: "sunt aut facere".to_string(),
            }])
        }
    }

    struct DownPosts;

    impl PostSource for DownPosts {
        fn fetch_posts(&self) -> Result<Vec<Post>, RemoteError> {
            Err(RemoteError::Status(500))
        }
    }

    #[test]
    fn posts_are_mapped_to_rows() {
        let response = fetch_posts_from(&FixedPosts);
        assert!(response.ok);
        assert_eq!(
            response.items,
            vec![PostItem {
                id: 1,
                title: "sunt aut facere".to_string(),
            }]
        );
        assert_eq!(response.message, "");
    }

    #[test]
    fn posts_failure_uses_fixed_message() {
        let response = fetch_posts_from(&DownPosts);
        assert!(!response.ok);
        assert!(response.items.is_empty());
        assert_eq!(response.message, "Failed to fetch data");
    }

    #[test]
    fn navigator_logout_and_back() {
        let _guard = serial();
        let home = nav_current();
        assert_eq!(home.route, "Home");
        assert_eq!(home.title, "To-Do List");
        assert_eq!(home.right_action_label.as_deref(), Some("Logout"));

        let target = home.right_action_target.unwrap();
        let login = nav_navigate(target);
        assert!(login.ok);
        assert_eq!(login.route, "Login");
        assert_eq!(login.right_action_label, None);
        assert_eq!(login.depth, 2);

        let back = nav_back();
        assert!(back.ok);
        assert_eq!(back.route, "Home");
        assert_eq!(back.depth, 1);

        let at_root = nav_back();
        assert!(!at_root.ok);
        assert_eq!(at_root.route, "Home");
        assert!(!nav_navigate("Settings".to_string()).ok);
    }

    #[test]
    fn delete_dialog_follows_selection() {
        let _guard = serial();
        let text = unique_token("ffi-dialog");
        let added = task_add(text.clone());
        let item = find(&added.items, &text).unwrap();
        assert_eq!(delete_dialog_tick(300).phase, "hidden");

        task_select_for_deletion(item.id);
        // Buttons are inert until the dialog is on screen.
        assert!(find(&delete_dialog_respond(true).items, &text).is_some());

        let frame = delete_dialog_tick(100);
        assert_eq!(frame.phase, "fading_in");
        assert_eq!(frame.title, "Delete Task");
        assert_eq!(delete_dialog_tick(300).phase, "visible");

        let confirmed = delete_dialog_respond(true);
        assert!(find(&confirmed.items, &text).is_none());
        assert_eq!(confirmed.pending_deletion, None);

        assert_eq!(delete_dialog_tick(100).phase, "fading_out");
        let closed = delete_dialog_tick(300);
        assert_eq!(closed.phase, "hidden");
        assert_eq!(closed.opacity, 0.0);
    }
}
