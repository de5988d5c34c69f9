use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use fabric_core::{
    CommitOptions, DifferentiatorMode, LayoutMetrics, RawProps, Rect, RendererConfig,
    SharedShadowNode, SharedState, SurfaceId, Tag,
};
use fabric_runtime_scheduler::SchedulerPriority;
use fabric_runtime_std::StdRuntimeScheduler;
use fabric_uimanager::{
    ComponentDescriptorRegistry, HeadlessMountingManager, Scheduler, UIManager, UIManagerError,
};

const LIST_SURFACE: SurfaceId = 1;
const PROFILE_SURFACE: SurfaceId = 11;
const ROW_HEIGHT: f32 = 44.0;
const SCREEN_WIDTH: f32 = 360.0;
const AVATAR_TAG: Tag = 5001;

/// What the "JavaScript" side keeps between renders.
#[derive(Default)]
struct JsContext {
    items: Vec<i32>,
    rows: HashMap<i32, SharedShadowNode>,
    avatar_state: Option<SharedState>,
}

fn row_tag(item: i32) -> Tag {
    1000 + item * 2
}

fn label_tag(item: i32) -> Tag {
    1001 + item * 2
}

fn row_color(index: usize) -> &'static str {
    if index % 2 == 0 {
        "white"
    } else {
        "lightgray"
    }
}

fn row_frame(index: usize) -> LayoutMetrics {
    LayoutMetrics::with_frame(Rect::new(
        0.0,
        index as f32 * ROW_HEIGHT,
        SCREEN_WIDTH,
        ROW_HEIGHT,
    ))
}

fn render_list(ui: &UIManager, context: &mut JsContext) -> Result<(), UIManagerError> {
    let mut rows = HashMap::with_capacity(context.items.len());
    let mut children = Vec::with_capacity(context.items.len());
    for (index, &item) in context.items.iter().enumerate() {
        let props = RawProps::new().with("backgroundColor", row_color(index));
        let mut row = match context.rows.get(&item) {
            Some(previous) => ui.clone_node(previous, None, Some(&props)),
            None => {
                let label = ui.create_node(
                    label_tag(item),
                    "Paragraph",
                    LIST_SURFACE,
                    &RawProps::new().with("text", format!("Item {item}")),
                    None,
                )?;
                let mut row = ui.create_node(row_tag(item), "View", LIST_SURFACE, &props, None)?;
                row.append_child(Arc::new(label));
                row
            }
        };
        row.set_layout_metrics(row_frame(index));
        let row = Arc::new(row);
        rows.insert(item, Arc::clone(&row));
        children.push(row);
    }
    context.rows = rows;
    ui.complete_surface(LIST_SURFACE, children, CommitOptions::default())?;
    Ok(())
}

fn render_profile(ui: &UIManager, context: &mut JsContext) -> Result<(), UIManagerError> {
    let avatar = ui.create_node(
        AVATAR_TAG,
        "Image",
        PROFILE_SURFACE,
        &RawProps::new().with("source", "avatar.png"),
        Some(Arc::new("loading")),
    )?;
    context.avatar_state = avatar.state().cloned();
    let name = ui.create_node(
        AVATAR_TAG + 1,
        "Paragraph",
        PROFILE_SURFACE,
        &RawProps::new().with("text", "Ada"),
        None,
    )?;
    // Layout-only wrapper: flattened away by the differentiator.
    let mut header =
        ui.create_node(AVATAR_TAG + 2, "View", PROFILE_SURFACE, &RawProps::new(), None)?;
    header.append_child(Arc::new(avatar));
    header.append_child(Arc::new(name));
    ui.complete_surface(
        PROFILE_SURFACE,
        vec![Arc::new(header)],
        CommitOptions {
            mount_synchronously: true,
        },
    )?;
    Ok(())
}

fn schedule<F>(
    scheduler: &Arc<Scheduler<JsContext>>,
    priority: SchedulerPriority,
    label: &'static str,
    render: F,
) where
    F: FnOnce(&UIManager, &mut JsContext) -> Result<(), UIManagerError> + Send + 'static,
{
    let fabric = Arc::clone(scheduler);
    scheduler
        .runtime_scheduler()
        .schedule_task(priority, move |context, task| {
            log::info!("running {} ({}, late: {})", label, task.priority, task.did_timeout);
            if let Err(err) = render(fabric.ui_manager(), context) {
                log::error!("{} failed: {}", label, err);
            }
        });
}

fn main() {
    env_logger::init();

    println!("=== Fabric-RS Headless Demo ===");

    let runtime = match StdRuntimeScheduler::new(JsContext::default()) {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("could not start the runtime thread: {err}");
            return;
        }
    };
    let config = RendererConfig::default()
        .with_differentiator_mode(DifferentiatorMode::OptimizedMoves)
        .with_leak_checker(true);
    let scheduler = Scheduler::new(
        ComponentDescriptorRegistry::with_standard_components(),
        config,
        runtime.scheduler(),
    );
    let mounting = Arc::new(HeadlessMountingManager::new());
    scheduler.set_delegate(Some(mounting.clone()));

    let screen = LayoutMetrics::with_frame(Rect::new(0.0, 0.0, SCREEN_WIDTH, 640.0));
    for surface_id in [LIST_SURFACE, PROFILE_SURFACE] {
        if let Err(err) = scheduler.start_surface(surface_id, screen) {
            eprintln!("could not start surface {surface_id}: {err}");
            return;
        }
    }

    // Queued while the runtime is held, so they run by priority, not in
    // submission order.
    let queued = runtime.scheduler().execute_now_on_the_same_thread(|_| {
        schedule(&scheduler, SchedulerPriority::Low, "reorder", |ui, context| {
            context.items.reverse();
            context.items.retain(|item| item % 3 != 0);
            context.items.push(9);
            render_list(ui, context)
        });
        schedule(&scheduler, SchedulerPriority::Normal, "avatar loaded", |ui, context| {
            match &context.avatar_state {
                Some(state) => ui.update_state(state, Arc::new("loaded")).map(|_| ()),
                None => Ok(()),
            }
        });
        schedule(&scheduler, SchedulerPriority::UserBlocking, "first list", |ui, context| {
            context.items = (1..=6).collect();
            render_list(ui, context)
        });
        schedule(&scheduler, SchedulerPriority::UserBlocking, "profile", render_profile);
    });
    if let Err(err) = queued {
        eprintln!("could not queue the demo tasks: {err}");
        return;
    }

    let (done, finished) = mpsc::channel();
    runtime
        .scheduler()
        .schedule_task(SchedulerPriority::Idle, move |_, _| {
            let _ = done.send(());
        });
    if finished.recv_timeout(Duration::from_secs(10)).is_err() {
        eprintln!("runtime did not drain its queue");
    }

    for surface_id in [LIST_SURFACE, PROFILE_SURFACE] {
        if let Some(views) = mounting.view_tree(surface_id) {
            println!("surface {surface_id} ({} views):\n{views:?}", views.len());
        }
    }
    let stats = mounting.stats();
    println!(
        "mounted {} transactions, {} mutations, {} failures",
        stats.transactions, stats.mutations, stats.failures
    );
    println!("scheduler: {:?}", runtime.scheduler().stats());

    for surface_id in [LIST_SURFACE, PROFILE_SURFACE] {
        if let Err(err) = scheduler.stop_surface(surface_id) {
            log::warn!("stopping surface {}: {}", surface_id, err);
        }
    }
    // The runtime still holds the last rendered rows; drop them before checking.
    let _ = runtime
        .scheduler()
        .execute_now_on_the_same_thread(|context| *context = JsContext::default());
    for surface_id in [LIST_SURFACE, PROFILE_SURFACE] {
        let report = scheduler.ui_manager().check_for_leaks(surface_id);
        println!("surface {surface_id}: {} leaked nodes", report.leaked.len());
    }
    runtime.shutdown();
}
