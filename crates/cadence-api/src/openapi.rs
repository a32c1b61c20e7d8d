//! # OpenAPI Specification Assembly
//!
//! Collects every utoipa-documented route into one OpenAPI document served
//! at `/openapi.json`. Compliance and pipeline results come from library
//! crates without schema derives and are documented as free-form objects.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Static bearer token. Set via CADENCE_AUTH_TOKEN; unset disables auth.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cadence API",
        version = "0.3.2",
        description = "Campaign scheduling and publishing for a professional social feed.\n\nProvides:\n- **Campaigns and posts** with assets and a scheduled/posted/failed lifecycle\n- **Compliance checks** against the editorial rule table, with an audit trail\n- **Slot allocation** for single posts and whole campaigns\n- **Pipeline** runs that fix, tag, illustrate and schedule posts\n- **Publishing** on demand and by the background sweeper\n\nAll `/v1/*` endpoints take `Authorization: Bearer <token>` when a token is configured.",
        license(name = "BUSL-1.1")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        crate::routes::campaigns::list_campaigns,
        crate::routes::campaigns::get_campaign,
        crate::routes::campaigns::create_campaign,
        crate::routes::campaigns::update_campaign,
        crate::routes::campaigns::delete_campaign,
        crate::routes::posts::list_posts,
        crate::routes::posts::get_post,
        crate::routes::posts::create_post,
        crate::routes::posts::update_post,
        crate::routes::posts::delete_post,
        crate::routes::posts::publish_now,
        crate::routes::posts::retry_post,
        crate::routes::assets::register_asset,
        crate::routes::assets::delete_asset,
        crate::routes::compliance::check_text,
        crate::routes::compliance::list_rules,
        crate::routes::compliance::check_post,
        crate::routes::compliance::list_findings,
        crate::routes::schedule::suggest_timing,
        crate::routes::schedule::auto_schedule,
        crate::routes::schedule::audit_campaign_narrative,
        crate::routes::pipeline::auto_process,
        crate::routes::pipeline::auto_process_all,
        crate::routes::settings::get_settings,
        crate::routes::settings::update_settings,
        crate::routes::settings::get_publisher,
        crate::routes::settings::update_publisher,
        crate::routes::settings::test_publisher,
        crate::routes::stats::stats,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::state::CampaignRecord,
        crate::state::PostRecord,
        crate::state::AssetRecord,
        crate::state::FindingRecord,
        crate::state::AutomationSettings,
        crate::routes::campaigns::CampaignView,
        crate::routes::campaigns::CreateCampaignRequest,
        crate::routes::campaigns::UpdateCampaignRequest,
        crate::routes::posts::PostView,
        crate::routes::posts::CreatePostRequest,
        crate::routes::posts::UpdatePostRequest,
        crate::routes::assets::RegisterAssetRequest,
        crate::routes::compliance::CheckTextRequest,
        crate::routes::schedule::TimingSuggestion,
        crate::routes::schedule::AutoScheduleResponse,
        crate::routes::settings::UpdateSettingsRequest,
        crate::routes::settings::PublisherStatus,
        crate::routes::settings::PublisherCheck,
        crate::routes::settings::UpdatePublisherRequest,
        crate::routes::stats::PostCounts,
        crate::routes::stats::StatsResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "campaigns", description = "Campaigns and their post counts"),
        (name = "posts", description = "Post CRUD, publish now and retry"),
        (name = "assets", description = "Files attached to posts"),
        (name = "compliance", description = "Editorial rule checks and the audit trail"),
        (name = "schedule", description = "Slot suggestions, campaign narrative scheduling and audits"),
        (name = "pipeline", description = "Automated fix, tag, image and schedule runs"),
        (name = "settings", description = "Automation toggles and publisher credentials"),
        (name = "stats", description = "Dashboard counters"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
