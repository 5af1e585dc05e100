use serde_json::Value;
use stockcast_web::state::load_predictor;

use crate::cli::ServiceArgs;
use crate::error::CliError;

pub fn run(args: &ServiceArgs) -> Result<Value, CliError> {
    let predictor = load_predictor(&args.service)?;
    Ok(serde_json::to_value(predictor.describe())?)
}
