//! tabweave demo binary.
//!
//! With the `gui` feature: opens a window whose content area is driven by the
//! coordinator through native child webviews. Without it: walks an in-memory
//! backend and a headless host through the main lifecycle paths on the console.

#[cfg(feature = "gui")]
fn main() {
    tabweave::init_logging();
    if let Err(e) = tabweave::ui::webview_app::run() {
        eprintln!("tabweave: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "gui"))]
#[tokio::main]
async fn main() {
    use std::sync::Arc;

    use tabweave::app::App;
    use tabweave::gateway::memory::InMemoryGateway;
    use tabweave::host::headless::HeadlessHost;
    use tabweave::services::settings_engine::SettingsEngineTrait;

    tabweave::init_logging();

    println!();
    println!("tabweave v{} (headless demo)", env!("CARGO_PKG_VERSION"));
    println!();

    let mut app = match App::new(None) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("  settings unreadable ({}), using defaults", e);
            App::with_settings(Default::default())
        }
    };
    println!(
        "  Settings: {}",
        app.settings_engine.get_config_path().display()
    );

    let gateway = Arc::new(InMemoryGateway::with_tabs(&[
        "https://www.rust-lang.org",
        "https://crates.io",
        "https://docs.rs",
    ]));
    let host = Arc::new(HeadlessHost::new());
    let handle = app.startup(gateway.clone(), host.clone());

    demo::run(&handle, &host).await;

    app.shutdown().await;
    println!();
    println!("  Surfaces left after shutdown: {}", host.surface_ids().len());
}

#[cfg(not(feature = "gui"))]
mod demo {
    use tabweave::command::{Command, Outcome};
    use tabweave::host::headless::HeadlessHost;
    use tabweave::runtime::CoordinatorHandle;
    use tabweave::types::navigation::{CycleDirection, Modifiers};
    use tabweave::types::snapshot::Snapshot;

    fn section(name: &str) {
        println!("---------------------------------------------------------------");
        println!("  {}", name);
        println!("---------------------------------------------------------------");
    }

    fn print_snapshot(snapshot: &Snapshot) {
        for tab in &snapshot.tabs {
            let marker = if snapshot.active_id.as_deref() == Some(tab.id.as_str()) {
                "*"
            } else {
                " "
            };
            println!(
                "  {} [{}] {:<10} {}",
                marker,
                tab.index,
                tab.state.as_str(),
                tab.display_title()
            );
        }
        if snapshot.is_empty {
            println!("  (no tabs)");
        }
    }

    async fn show(handle: &CoordinatorHandle) {
        match handle.send(Command::GetSnapshot).await {
            Ok(Outcome::Snapshot(snapshot)) => print_snapshot(&snapshot),
            Ok(other) => println!("  unexpected outcome: {:?}", other),
            Err(e) => println!("  snapshot failed: {}", e),
        }
    }

    async fn step(handle: &CoordinatorHandle, label: &str, command: Command) {
        match handle.send(command).await {
            Ok(_) => println!("  {}: ok", label),
            Err(e) => println!("  {}: {}", label, e),
        }
    }

    pub async fn run(handle: &CoordinatorHandle, host: &HeadlessHost) {
        section("Initial reconcile");
        step(handle, "refresh", Command::Refresh).await;
        show(handle).await;
        println!("  Visible surfaces: {:?}", host.visible_ids());
        println!();

        section("Cycling");
        step(
            handle,
            "cycle forward",
            Command::Cycle {
                direction: CycleDirection::Forward,
            },
        )
        .await;
        show(handle).await;
        println!();

        section("Open dispositions");
        step(
            handle,
            "open in background",
            Command::OpenUrl {
                url: "https://github.com".into(),
                modifiers: Modifiers::accel(),
            },
        )
        .await;
        step(
            handle,
            "search from address bar",
            Command::SubmitInput {
                text: "tokio broadcast channel".into(),
                modifiers: Modifiers::none(),
            },
        )
        .await;
        show(handle).await;
        println!();

        section("Housekeeping");
        step(handle, "run", Command::RunHousekeeping).await;
        show(handle).await;
        println!("  Host operations so far: {}", host.ops().len());
    }
}
