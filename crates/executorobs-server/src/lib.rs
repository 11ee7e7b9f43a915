//! HTTP front of `executorobs`: `GET /api/cluster/info` dispatched to the
//! single worker through the gateway.

pub mod server;
