use std::sync::Arc;

use crate::CounterConfig;
use crate::FixedBuffer;
use crate::HostError;
use crate::MockBodyHost;
use crate::OutboundBody;
use crate::SizeCoordinator;

/// Host that builds any container and materializes it into `len` bytes.
pub(crate) fn mock_host_reading(len: usize) -> MockBodyHost {
    let mut host = MockBodyHost::new();
    host.expect_build_body()
        .returning(|_| Ok(OutboundBody::from_bytes("application/test", Vec::new())));
    host.expect_can_read_body().returning(|| true);
    host.expect_read_body()
        .returning(move |_| Ok(FixedBuffer::zeroed(len)));
    host
}

/// Host that refuses to build any body.
pub(crate) fn mock_host_rejecting() -> MockBodyHost {
    let mut host = MockBodyHost::new();
    host.expect_build_body()
        .returning(|_| Err(HostError::new("Fetch API is not available")));
    host.expect_can_read_body().never();
    host.expect_read_body().never();
    host
}

pub(crate) fn coordinator_with_host(host: MockBodyHost) -> SizeCoordinator {
    SizeCoordinator::builder(CounterConfig::default())
        .body_host(Arc::new(host))
        .build()
        .expect("runtime is available in tests")
}
