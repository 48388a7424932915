use anyhow::Context as _;
use anyhow::Result;

use acbridge_clients_coredata::CoreData;
use acbridge_clients_coredata::Filter;
use acbridge_context::Context;
use acbridge_errors::ModelNotFound;
use acbridge_errors::UpstreamQueryFailed;
use acbridge_models::ModelRecord;

/// Fetch the model classifying the family of entities with the given key.
///
/// Models are not cached and are fetched again on each call.
/// If the core-data service returns more than one model for the family the first is used.
pub async fn resolve_model(
    context: &Context,
    core_data: &CoreData,
    family_key: &str,
) -> Result<ModelRecord> {
    let filter = Filter::field_in(ModelRecord::FAMILY_FIELD, [family_key]);
    let models = core_data
        .query(context, ModelRecord::KIND, &filter)
        .await
        .with_context(|| {
            let detail = format!("family '{}'", family_key);
            UpstreamQueryFailed::new(ModelRecord::KIND, detail)
        })?;

    let model = match models.first() {
        Some(model) => model,
        None => {
            slog::error!(context.logger, "Model not found"; "family" => family_key);
            anyhow::bail!(ModelNotFound::new(family_key));
        }
    };
    if models.len() > 1 {
        slog::warn!(
            context.logger, "Found more than one model for the family, using the first";
            "family" => family_key,
            "models" => models.len(),
        );
    }
    ModelRecord::parse(model)
}
