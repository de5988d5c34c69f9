//! Glue between the UIManager and the host: decides when finished
//! transactions reach the mounting layer.

use std::fmt;
use std::sync::{Arc, Weak};

use fabric_core::{
    LayoutMetrics, MountingCoordinator, RendererConfig, ShadowTree, SurfaceId,
};
use fabric_runtime_scheduler::RuntimeScheduler;
use parking_lot::RwLock;

use crate::component_registry::ComponentDescriptorRegistry;
use crate::delegate::UIManagerDelegate;
use crate::error::UIManagerError;
use crate::ui_manager::UIManager;

/// Host side of the renderer: usually the platform mounting manager.
pub trait SchedulerDelegate: Send + Sync {
    /// New mutations are ready to be pulled from `coordinator`.
    fn scheduler_did_finish_transaction(&self, coordinator: Arc<MountingCoordinator>);

    fn scheduler_did_start_surface(&self, tree: &ShadowTree) {
        let _ = tree;
    }

    fn scheduler_did_stop_surface(&self, surface_id: SurfaceId) {
        let _ = surface_id;
    }
}

/// Owns the UIManager and forwards its transactions to a
/// [`SchedulerDelegate`], either right away (synchronous mounting) or as a
/// rendering update of the runtime scheduler.
pub struct Scheduler<R: Send + 'static> {
    ui_manager: Arc<UIManager>,
    runtime_scheduler: RuntimeScheduler<R>,
    delegate: RwLock<Option<Arc<dyn SchedulerDelegate>>>,
}

impl<R: Send + 'static> Scheduler<R> {
    pub fn new(
        components: ComponentDescriptorRegistry,
        config: RendererConfig,
        runtime_scheduler: RuntimeScheduler<R>,
    ) -> Arc<Self> {
        let scheduler = Arc::new(Self {
            ui_manager: UIManager::new(components, config),
            runtime_scheduler,
            delegate: RwLock::new(None),
        });
        let weak = Arc::downgrade(&scheduler);
        let delegate: Weak<dyn UIManagerDelegate> = weak;
        scheduler.ui_manager.set_delegate(Some(delegate));
        scheduler
    }

    pub fn ui_manager(&self) -> &Arc<UIManager> {
        &self.ui_manager
    }

    pub fn runtime_scheduler(&self) -> &RuntimeScheduler<R> {
        &self.runtime_scheduler
    }

    pub fn set_delegate(&self, delegate: Option<Arc<dyn SchedulerDelegate>>) {
        *self.delegate.write() = delegate;
    }

    pub fn delegate(&self) -> Option<Arc<dyn SchedulerDelegate>> {
        self.delegate.read().clone()
    }

    pub fn start_surface(
        &self,
        surface_id: SurfaceId,
        layout_metrics: LayoutMetrics,
    ) -> Result<Arc<ShadowTree>, UIManagerError> {
        let tree = self.ui_manager.start_surface(surface_id, layout_metrics)?;
        if let Some(delegate) = self.delegate() {
            delegate.scheduler_did_start_surface(&tree);
        }
        Ok(tree)
    }

    pub fn stop_surface(&self, surface_id: SurfaceId) -> Result<(), UIManagerError> {
        self.ui_manager.stop_surface(surface_id)?;
        if let Some(delegate) = self.delegate() {
            delegate.scheduler_did_stop_surface(surface_id);
        }
        Ok(())
    }
}

impl<R: Send + 'static> UIManagerDelegate for Scheduler<R> {
    fn ui_manager_did_finish_transaction(
        &self,
        coordinator: Arc<MountingCoordinator>,
        mount_synchronously: bool,
    ) {
        let Some(delegate) = self.delegate() else {
            return;
        };
        if mount_synchronously {
            delegate.scheduler_did_finish_transaction(coordinator);
        } else {
            self.runtime_scheduler
                .schedule_rendering_update(move || delegate.scheduler_did_finish_transaction(coordinator));
        }
    }
}

impl<R: Send + 'static> fmt::Debug for Scheduler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("ui_manager", &self.ui_manager)
            .field("runtime_scheduler", &self.runtime_scheduler)
            .field("has_delegate", &self.delegate.read().is_some())
            .finish()
    }
}
