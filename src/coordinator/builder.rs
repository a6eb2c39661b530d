//! Builder for [`SizeCoordinator`].
//!
//! The body host defaults to [`NativeBodyHost`], or to [`NoBodyHost`] when
//! `serializer.enabled` is off. Tests and embedders inject their own host with
//! [`SizeCoordinatorBuilder::body_host`].
//!
//! ## Example
//! ```ignore
//! let coordinator = SizeCoordinatorBuilder::new(CounterConfig::new()?.validate()?)
//!     .body_host(Arc::new(MyHost::default()))
//!     .build()?;
//! let mut events = coordinator.subscribe();
//! coordinator.set_value("zażółć");
//! ```

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use super::SizeCoordinator;
use crate::BodyHost;
use crate::CompositeSerializer;
use crate::CounterConfig;
use crate::Error;
use crate::NativeBodyHost;
use crate::NoBodyHost;
use crate::Result;

pub struct SizeCoordinatorBuilder {
    config: CounterConfig,
    body_host: Option<Arc<dyn BodyHost>>,
    runtime: Option<Handle>,
}

impl SizeCoordinatorBuilder {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            config,
            body_host: None,
            runtime: None,
        }
    }

    /// Replaces the default body host.
    pub fn body_host(
        mut self,
        host: Arc<dyn BodyHost>,
    ) -> Self {
        self.body_host = Some(host);
        self
    }

    /// Runtime that drives debounce timers. Defaults to the current one.
    pub fn runtime(
        mut self,
        handle: Handle,
    ) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// # Errors
    /// Returns [`Error::Config`] when the configuration fails
    /// [`CounterConfig::validate`], and [`Error::RuntimeUnavailable`] when no
    /// runtime was given and none is running.
    pub fn build(self) -> Result<SizeCoordinator> {
        let config = self.config.validate()?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| Error::RuntimeUnavailable(e.to_string()))?,
        };

        let host = match self.body_host {
            Some(host) => host,
            None if config.serializer.enabled => {
                Arc::new(NativeBodyHost::new(&config.serializer)?) as Arc<dyn BodyHost>
            }
            None => {
                debug!("serializer disabled, composite values will fail to serialize");
                Arc::new(NoBodyHost)
            }
        };

        Ok(SizeCoordinator::new(
            CompositeSerializer::new(host),
            config.coordinator.debounce_delay(),
            runtime,
        ))
    }
}

impl SizeCoordinator {
    pub fn builder(config: CounterConfig) -> SizeCoordinatorBuilder {
        SizeCoordinatorBuilder::new(config)
    }
}
