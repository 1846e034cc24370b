//! CMDB projection of emitted metric labels.
//!
//! Check outputs carrying `client`/`server` labels describe service-to-service
//! calls. `project` turns a batch of outputs into discovered-service CIs and
//! "Depends on::Used by" relations, and an `UpsertSink` hands that payload to
//! the identification engine.

pub mod payload;
pub mod projection;
pub mod upsert;

pub use payload::{CheckResult, CiItem, CiRelation, IrePayload};
pub use projection::{project, Projection};
pub use upsert::{submit, IdentificationEngineClient, UpsertReport, UpsertSink};
