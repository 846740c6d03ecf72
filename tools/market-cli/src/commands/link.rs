//! Shareable search links.

use anyhow::Result;
use market_search::chips::active_chips;
use market_search::codec;
use market_search::filter::FilterState;
use serde_json::json;

use super::{FacetArgs, LinkArgs, LinkCommand};
use crate::context::Context;

/// Run the link command.
pub async fn run(args: LinkArgs, ctx: &Context) -> Result<()> {
    match args.command {
        LinkCommand::Encode(facets) => encode(&facets, ctx),
        LinkCommand::Decode { query } => decode(&query, ctx),
    }
}

fn encode(facets: &FacetArgs, ctx: &Context) -> Result<()> {
    let state = facets.to_state();
    let href = codec::to_href(&ctx.config.search.path, &state);

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "href": href,
            "query": codec::to_query_string(&state),
        }));
    } else {
        println!("{}", href);
    }
    Ok(())
}

fn decode(query: &str, ctx: &Context) -> Result<()> {
    let query = query.split_once('?').map_or(query, |(_, q)| q);
    let state = FilterState::from_query_string(query);
    let canonical = codec::to_query_string(&state);

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "state": state,
            "canonical": canonical,
            "chips": active_chips(&state),
        }));
        return Ok(());
    }

    ctx.output.header("Filters");
    let range = state.price_range();
    ctx.output.kv("query", state.query_text());
    ctx.output.kv("categories", &state.categories().join(", "));
    ctx.output
        .kv("price", &format!("{} - {}", range.min, range.max));
    ctx.output.kv("location", state.location());
    ctx.output.kv("page", &state.page().to_string());

    if canonical != query {
        ctx.output.warn(&format!(
            "Link is not canonical; the search page rewrites it to ?{}",
            canonical
        ));
    }
    Ok(())
}
