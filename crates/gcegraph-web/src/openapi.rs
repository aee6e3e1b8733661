//! OpenAPI documentation definition.

use gcegraph_core::api::{
    ApiHost, ApiInventory, ApiRegionSummary, ApiTotals, ChartOrientation, ChartSeries, ChartSpec,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::handle_health,
        crate::handlers::handle_inventory,
        crate::handlers::handle_hosts,
        crate::handlers::handle_regions,
        crate::handlers::handle_region,
        crate::handlers::handle_summary_charts,
        crate::handlers::handle_region_charts,
    ),
    components(schemas(
        ApiInventory,
        ApiTotals,
        ApiRegionSummary,
        ApiHost,
        ChartSpec,
        ChartSeries,
        ChartOrientation,
    )),
    info(
        title = "gcegraph API",
        version = "1.0",
        description = "Compute Engine resource usage aggregated by region"
    )
)]
pub(crate) struct ApiDoc;
