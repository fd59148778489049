/// Ports layer - interface definitions between core and infrastructure
pub mod outbound;
