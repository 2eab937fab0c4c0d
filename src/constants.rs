// -
// Registry key layout

pub(crate) const NAMESPACES_SEGMENT: &str = "namespaces";
pub(crate) const SERVICES_SEGMENT: &str = "services";
pub(crate) const ENDPOINTS_SEGMENT: &str = "endpoints";

/// Prefix under which registry objects are stored by default
pub const DEFAULT_KEY_PREFIX: &str = "/service-registry";

// -
// Adaptor

pub const DEFAULT_ADAPTOR_URL: &str = "http://localhost:80/cnwan";

/// Path appended to the adaptor url when posting batches
pub(crate) const EVENTS_PATH: &str = "events";

/// Host that replaces localhost when running inside a container
pub(crate) const DOCKER_HOST_ALIAS: &str = "host.docker.internal";

// -
// Watch

/// Buffer between a key-value watch task and the orchestrator
pub(crate) const WATCH_CHANNEL_SIZE: usize = 1024;
