//! The closed set of `(service, operation)` pairs a plan may reference
//! (§4.4: "each step must reference a known (service, operation) from the
//! registry"). The concrete operation names are an implementation choice —
//! the spec names the five services but not their operations — documented
//! in `DESIGN.md`.

use crate::model::Service;

/// Returns the operations recognized for a given service.
pub fn operations_for(service: Service) -> &'static [&'static str] {
    match service {
        Service::Sandbox => &["execute"],
        Service::Fileprocess => &["process"],
        Service::Cyberagent => &["scan"],
        Service::Mageagent => &["complete"],
        Service::Graphrag => &["query", "store"],
    }
}

/// Whether `(service, operation)` is a recognized pair.
pub fn is_known_operation(service: Service, operation: &str) -> bool {
    operations_for(service).contains(&operation)
}
