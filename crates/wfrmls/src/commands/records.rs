//! `list`, `get` and `metadata`.

use clap::ValueEnum;
use serde_json::Value;

use wfrmls_api::{ODataQuery, Resource, ResourceClient, WfrmlsClient};

use crate::cli::{GetArgs, ListArgs, OutputFormat, ResourceKind};
use crate::error::CliError;
use crate::output;

enum Op<'a> {
    List(&'a ListArgs),
    Get(&'a str),
}

pub async fn list(
    client: &WfrmlsClient,
    args: &ListArgs,
    format: OutputFormat,
) -> Result<(), CliError> {
    let result = on_resource(client, args.resource, Op::List(args)).await?;
    output::emit(format, &result)
}

pub async fn get(
    client: &WfrmlsClient,
    args: &GetArgs,
    format: OutputFormat,
) -> Result<(), CliError> {
    if args.key.trim().is_empty() {
        return Err(CliError::Validation {
            field: "key".into(),
            reason: "must not be empty".into(),
        });
    }
    let record = on_resource(client, args.resource, Op::Get(&args.key)).await?;
    output::emit(format, &record)
}

/// The XML metadata document is printed as-is, whatever `--output` says.
pub async fn metadata(client: &WfrmlsClient) -> Result<(), CliError> {
    let xml = client.metadata().await?;
    output::print_output(&xml)
}

fn build_query(args: &ListArgs) -> ODataQuery {
    let mut query = ODataQuery::new().top(args.top);
    if let Some(skip) = args.skip {
        query = query.skip(skip);
    }
    if let Some(filter) = &args.filter {
        query = query.filter(filter.as_str());
    }
    if let Some(select) = &args.select {
        query = query.select(select.as_str());
    }
    if let Some(orderby) = &args.orderby {
        query = query.orderby(orderby.as_str());
    }
    if let Some(expand) = &args.expand {
        query = query.expand(expand.as_str());
    }
    if args.count {
        query = query.count(true);
    }
    query
}

async fn run<R: Resource>(client: &ResourceClient<R>, op: Op<'_>) -> Result<Value, CliError> {
    let value = match op {
        Op::List(args) if args.all => {
            let query = build_query(args);
            let records = client.list_all(query, args.top, args.max_pages).await?;
            serde_json::to_value(records)?
        }
        Op::List(args) => serde_json::to_value(client.list(&build_query(args)).await?)?,
        Op::Get(key) => Value::Object(client.get(key).await?),
    };
    Ok(value)
}

async fn on_resource(
    client: &WfrmlsClient,
    kind: ResourceKind,
    op: Op<'_>,
) -> Result<Value, CliError> {
    let result = match kind {
        ResourceKind::Property => run(client.property(), op).await,
        ResourceKind::Member => run(client.member(), op).await,
        ResourceKind::Office => run(client.office(), op).await,
        ResourceKind::OpenHouse => run(client.openhouse(), op).await,
        ResourceKind::Media => run(client.media(), op).await,
        ResourceKind::History => run(client.history(), op).await,
        ResourceKind::GreenVerification => run(client.green_verification(), op).await,
        ResourceKind::DataSystem => run(client.data_system(), op).await,
        ResourceKind::Resource => run(client.resource(), op).await,
        ResourceKind::UnitTypes => run(client.property_unit_types(), op).await,
        ResourceKind::Lookup => run(client.lookup(), op).await,
        ResourceKind::Adu => run(client.adu(), op).await,
        ResourceKind::Deleted => run(client.deleted(), op).await,
    };
    result.map_err(|e| {
        let name = kind.to_possible_value().map(|v| v.get_name().to_owned()).unwrap_or_default();
        e.for_resource(&name)
    })
}
