//! Integration tests for the cloudlens library

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{layout::Rect, Frame};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use cloudlens::source::Target;
use cloudlens::view::{
    browser_factory, AliasView, AppRequest, Browser, Component, KeyOutcome, MenuHint, ViewContext, ViewFactory,
};
use cloudlens::{
    catalog, AliasStore, Column, Config, DataSource, DataSources, Dispatch, LensError, LensResult, NavigationStack,
    Router, Session, StaticSource, ViewerRegistry,
};

fn config(dir: &TempDir) -> Config {
    Config::load(dir.path()).unwrap()
}

fn ctx(config: &Config) -> ViewContext {
    ViewContext::new(Session::default(), config, CancellationToken::new())
}

fn static_sources() -> DataSources {
    DataSources::new().with_fallback(|target: &Target<'_>| {
        let rows = vec![vec![format!("{}-1", target.resource)], vec![format!("{}-2", target.resource)]];
        Ok(Arc::new(StaticSource::new(vec![Column::new("Name")], rows)) as Arc<dyn DataSource>)
    })
}

/// Default browser factory that counts how often it runs
fn counting_fallback(calls: Arc<AtomicUsize>) -> ViewFactory {
    let inner = browser_factory(static_sources());
    Arc::new(move |target: &Target<'_>| {
        calls.fetch_add(1, Ordering::SeqCst);
        inner(target)
    })
}

fn router_with(dir: &TempDir, registry: ViewerRegistry) -> Router {
    let config = config(dir);
    let aliases = Arc::new(AliasStore::new(config.aliases_file()));
    catalog::register_builtins(&aliases).unwrap();

    let ctx = ctx(&config);
    let root = Box::new(AliasView::new(Arc::clone(&aliases)));
    let stack = Arc::new(NavigationStack::new(root, &ctx).unwrap());
    let router = Router::new(aliases, Arc::new(registry), stack, ctx, catalog::services_for(Default::default()));
    router.init().unwrap();
    router
}

#[tokio::test]
async fn test_unregistered_resource_falls_back_to_browser() {
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let router = router_with(&dir, ViewerRegistry::builder(counting_fallback(Arc::clone(&calls))).build());

    let before = router.stack().len();
    let dispatch = router.run("ec2", "", false).unwrap();

    assert_eq!(dispatch, Dispatch::Viewing { resource: "ec2".to_string() });
    assert_eq!(router.stack().len(), before + 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(router.stack().top_name().as_deref(), Some("ec2"));
}

#[tokio::test]
async fn test_quit_leaves_stack_untouched() {
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let router = router_with(&dir, ViewerRegistry::builder(counting_fallback(Arc::clone(&calls))).build());
    router.run("ec2", "", false).unwrap();

    for quit in ["q", "q!", "Q", "quit"] {
        assert_eq!(router.run(quit, "", false).unwrap(), Dispatch::Quit);
    }
    assert_eq!(router.stack().len(), 2);
    assert_eq!(router.stack().top_name().as_deref(), Some("ec2"));
}

#[tokio::test]
async fn test_unknown_command_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let router = router_with(&dir, ViewerRegistry::builder(counting_fallback(Arc::clone(&calls))).build());

    let err = router.run("foobar", "", false).unwrap_err();
    assert!(matches!(err, LensError::CommandNotFound(ref c) if c == "foobar"));
    assert_eq!(err.to_string(), "`foobar` command not found");
    assert_eq!(router.stack().len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_s3_enter_opens_objects() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let router = catalog::compose(&config, Session::default(), static_sources(), CancellationToken::new()).unwrap();

    router.run("S3", "", false).unwrap();
    router.stack().with_top(|c| {
        c.table_mut()
            .unwrap()
            .model_mut()
            .set_rows(vec![vec!["logs-bucket".to_string()]])
    });
    let outcome = router
        .stack()
        .with_top(|c| c.handle_key(KeyEvent::from(KeyCode::Enter)))
        .unwrap();
    assert_eq!(
        outcome,
        KeyOutcome::Request(AppRequest::Open {
            resource: catalog::OBJ.to_string(),
            path: "logs-bucket".to_string(),
        })
    );

    router.open(catalog::OBJ, "logs-bucket", false).unwrap();
    assert_eq!(router.stack().breadcrumbs(), vec!["Aliases", "s3", "OBJ(logs-bucket)"]);
}

#[test]
fn test_resolve_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = AliasStore::new(dir.path().join("aliases.toml"));
    catalog::register_builtins(&store).unwrap();
    store.ensure().unwrap();

    for alias in store.list() {
        let first = store.resolve(&alias.mnemonic);
        assert_eq!(first, store.resolve(&alias.mnemonic));
        assert_eq!(first.as_deref(), Some(alias.resource.as_str()));
    }
}

#[test]
fn test_user_aliases_merge_over_builtins() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aliases.toml");
    std::fs::write(
        &path,
        "[aliases]\nec2 = \"ec2:i\"\nq = \"s3\"\nbuckets = \"s3\"\n\"bad name\" = \"s3\"\n",
    )
    .unwrap();

    let store = AliasStore::new(&path);
    catalog::register_builtins(&store).unwrap();
    store.ensure().unwrap();

    assert_eq!(store.resolve("ec2").as_deref(), Some("ec2:i"));
    assert_eq!(store.resolve("buckets").as_deref(), Some("s3"));
    assert!(!store.check("q"));
    assert!(!store.check("bad name"));

    store.clear_user().unwrap();
    assert_eq!(store.resolve("ec2").as_deref(), Some("ec2"));
    assert!(!store.check("buckets"));
}

#[test]
fn test_unparsable_alias_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aliases.toml");
    std::fs::write(&path, "aliases = [not toml").unwrap();

    let store = AliasStore::new(&path);
    assert!(store.ensure().is_err());
}

#[tokio::test]
async fn test_reset_recovers_from_corrupt_alias_file() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    std::fs::write(config.aliases_file(), "[aliases\nbroken").unwrap();

    assert!(matches!(
        catalog::compose(&config, Session::default(), static_sources(), CancellationToken::new()),
        Err(LensError::AliasStore(_))
    ));

    let store = catalog::reset_aliases(&config).unwrap();
    assert_eq!(store.resolve("ec2").as_deref(), Some("ec2"));
    assert!(store.list().iter().all(|alias| alias.origin.to_string() == "built-in"));

    let router =
        catalog::compose(&config, Session::default(), static_sources(), CancellationToken::new()).unwrap();
    assert_eq!(router.aliases().len(), store.len());
    router.stack().stop_all();
}

/// Records lifecycle calls so ordering can be asserted
struct Recorder {
    name: String,
    starts: Arc<AtomicUsize>,
    fail_init: bool,
}

impl Component for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, _ctx: &ViewContext) -> LensResult<()> {
        if self.fail_init {
            return Err(LensError::Init {
                component: self.name.clone(),
                reason: "no credentials".to_string(),
            });
        }
        Ok(())
    }

    fn start(&mut self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&mut self) {}

    fn hints(&self) -> Vec<MenuHint> {
        Vec::new()
    }

    fn handle_key(&mut self, _key: KeyEvent) -> KeyOutcome {
        KeyOutcome::Ignored
    }

    fn draw(&mut self, _f: &mut Frame, _area: Rect) {}
}

fn recorder(name: &str, starts: &Arc<AtomicUsize>, fail_init: bool) -> Box<dyn Component> {
    Box::new(Recorder {
        name: name.to_string(),
        starts: Arc::clone(starts),
        fail_init,
    })
}

#[test]
fn test_push_pop_reactivates_previous_top() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx(&config(&dir));
    let root_starts = Arc::new(AtomicUsize::new(0));
    let starts = Arc::new(AtomicUsize::new(0));
    let stack = NavigationStack::new(recorder("root", &root_starts, false), &ctx).unwrap();
    stack.push(recorder("ec2", &starts, false), &ctx).unwrap();
    assert_eq!(starts.load(Ordering::SeqCst), 1);

    let depth = stack.len();
    stack.push(recorder("s3", &Arc::new(AtomicUsize::new(0)), false), &ctx).unwrap();
    stack.pop().unwrap();

    assert_eq!(stack.len(), depth);
    assert_eq!(stack.top_name().as_deref(), Some("ec2"));
    assert_eq!(starts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_clear_returns_to_root_from_any_depth() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx(&config(&dir));
    let starts = Arc::new(AtomicUsize::new(0));
    let stack = NavigationStack::new(recorder("root", &starts, false), &ctx).unwrap();

    for depth in 0..4 {
        for i in 0..depth {
            stack.push(recorder(&format!("v{}", i), &starts, false), &ctx).unwrap();
        }
        stack.clear();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top_name().as_deref(), Some("root"));
    }
}

#[test]
fn test_failed_init_is_not_pushed() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx(&config(&dir));
    let starts = Arc::new(AtomicUsize::new(0));
    let stack = NavigationStack::new(recorder("root", &starts, false), &ctx).unwrap();

    let err = stack.push(recorder("iam:u", &starts, true), &ctx).unwrap_err();
    assert!(matches!(err, LensError::Init { .. }));
    assert_eq!(stack.len(), 1);
    assert_eq!(starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_router_surfaces_init_failure() {
    let dir = TempDir::new().unwrap();
    let starts = Arc::new(AtomicUsize::new(0));
    let failing: ViewFactory = {
        let starts = Arc::clone(&starts);
        Arc::new(move |target: &Target<'_>| Some(recorder(target.resource, &starts, true)))
    };
    let router = router_with(&dir, ViewerRegistry::builder(failing).build());

    assert!(router.run("sqs", "", false).is_err());
    assert!(router.run("sqs", "", true).is_err());
    assert_eq!(router.stack().len(), 1);
    assert_eq!(starts.load(Ordering::SeqCst), 0);
}

struct Gated {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait::async_trait]
impl DataSource for Gated {
    fn columns(&self) -> Vec<Column> {
        vec![Column::new("Name")]
    }

    async fn fetch(&self, _cancel: CancellationToken) -> LensResult<Vec<cloudlens::Row>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        Ok(vec![vec![format!("tick-{}", n)]])
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetch_skips_next_tick() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let calls = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(Gated {
        calls: Arc::clone(&calls),
        delay: Duration::from_secs(25),
    });
    let mut browser = Browser::new("ec2", "", source);
    browser.init(&ctx(&config)).unwrap();

    // forced fetch at 0s runs until 25s; the tick at 20s is dropped
    browser.start();
    tokio::time::sleep(Duration::from_secs(21)).await;
    browser.tick();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(browser.table().unwrap().model().rows.is_empty());
    assert_eq!(browser.table().unwrap().refresh_stats().skipped, 1);

    tokio::time::sleep(Duration::from_secs(5)).await;
    browser.tick();
    assert_eq!(browser.table().unwrap().model().rows, vec![vec!["tick-1".to_string()]]);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_viewer_discards_in_flight_result() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let calls = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(Gated {
        calls: Arc::clone(&calls),
        delay: Duration::from_secs(5),
    });
    let mut browser = Browser::new("ec2", "", source);
    browser.init(&ctx(&config)).unwrap();

    browser.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    browser.stop();
    tokio::time::sleep(Duration::from_secs(10)).await;
    browser.tick();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(browser.table().unwrap().model().rows.is_empty());
    assert_eq!(browser.table().unwrap().refresh_stats().discarded, 1);
}

#[tokio::test]
async fn test_app_prompt_and_back_navigation() {
    use cloudlens::cli::tui::{App, InputMode};

    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let router = catalog::compose(&config, Session::default(), static_sources(), CancellationToken::new()).unwrap();
    let mut app = App::new(router, &config, None);

    app.start();
    assert_eq!(app.router().stack().top_name().as_deref(), Some("ec2"));

    app.handle_key(KeyEvent::from(KeyCode::Char(':')));
    assert_eq!(app.input_mode, InputMode::Command);
    for c in "sqs".chars() {
        app.handle_key(KeyEvent::from(KeyCode::Char(c)));
    }
    app.handle_key(KeyEvent::from(KeyCode::Enter));
    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.router().stack().len(), 3);
    assert_eq!(app.history, vec!["sqs".to_string()]);

    app.handle_key(KeyEvent::from(KeyCode::Char('z')));
    assert_eq!(app.status_message.as_ref().map(|(m, _)| m.as_str()), Some("export unavailable"));

    app.handle_key(KeyEvent::from(KeyCode::Esc));
    app.handle_key(KeyEvent::from(KeyCode::Esc));
    assert_eq!(app.router().stack().len(), 1);

    app.run_command("nope");
    assert_eq!(
        app.status_message.as_ref().map(|(m, _)| m.as_str()),
        Some("`nope` command not found")
    );

    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
    app.shutdown();
}

#[tokio::test]
async fn test_app_esc_leaves_alias_view() {
    use cloudlens::cli::tui::App;

    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let router = catalog::compose(&config, Session::default(), static_sources(), CancellationToken::new()).unwrap();
    let mut app = App::new(router, &config, None);
    app.start();

    app.run_command("aliases");
    assert_eq!(app.router().stack().len(), 3);
    assert_eq!(app.router().stack().top_name().as_deref(), Some("aliases"));

    app.handle_key(KeyEvent::from(KeyCode::Esc));
    assert_eq!(app.router().stack().len(), 2);
    assert_eq!(app.router().stack().top_name().as_deref(), Some("ec2"));

    app.handle_key(KeyEvent::from(KeyCode::Esc));
    app.handle_key(KeyEvent::from(KeyCode::Esc));
    assert_eq!(app.router().stack().len(), 1);
    assert_eq!(
        app.status_message.as_ref().map(|(m, _)| m.as_str()),
        Some("Already at the root view")
    );
    app.shutdown();
}
