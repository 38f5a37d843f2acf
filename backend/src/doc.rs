//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers every HTTP endpoint from the
//! inbound layer and the payload schemas they exchange. The generated
//! specification is served through Swagger UI in debug builds.

use utoipa::OpenApi;

use crate::domain::{
    EnhancementResult, EnhancementStatus, Error, ErrorCode, ReferenceData, Scope,
    TargetConfidence, TargetMapping,
};
use crate::inbound::http::enhancement::EnhanceRequestBody;
use crate::inbound::http::snapshots::{SnapshotAcceptedBody, SnapshotBuildState};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reference enrichment API",
        description = "Grounds extracted material fields in cached reference data."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::enhancement::enhance_extraction,
        crate::inbound::http::snapshots::schedule_reference_snapshot,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        EnhanceRequestBody,
        EnhancementResult,
        EnhancementStatus,
        Error,
        ErrorCode,
        ReferenceData,
        Scope,
        SnapshotAcceptedBody,
        SnapshotBuildState,
        TargetConfidence,
        TargetMapping,
    )),
    tags(
        (name = "enhancement", description = "Field enhancement against reference data"),
        (name = "snapshots", description = "Reference snapshot materialisation"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
