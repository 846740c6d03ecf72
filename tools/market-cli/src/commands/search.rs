//! Run one search through a search session.

use anyhow::{bail, Context as _, Result};
use market_data::RestCatalog;
use market_search::codec;
use market_search::memory::MemoryCatalog;
use market_search::session::{RenderState, SearchDriver, SearchSession, SearchView};
use market_search::CatalogSource;

use super::SearchArgs;
use crate::context::Context;
use crate::output::{format_price, truncate};

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let state = args.facets.to_state();
    let query = codec::to_query_string(&state);
    ctx.output.debug(&format!("Mounting search page with ?{}", query));

    let session = SearchSession::new(ctx.config.search.clone(), &query);

    match &args.fixture {
        Some(path) => {
            let path = ctx.resolve_path(path);
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
            let catalog = MemoryCatalog::from_json(&content)
                .with_context(|| format!("Failed to parse fixture: {}", path.display()))?;
            ctx.output
                .debug(&format!("Loaded {} fixture rows", catalog.len()));
            execute(session, catalog, ctx).await
        }
        None => {
            if !ctx.config.backend.is_configured() {
                bail!("No backend configured. Set [backend].url in market.toml or pass --fixture.");
            }
            let catalog =
                RestCatalog::new(&ctx.config.backend).context("Invalid backend configuration")?;
            execute(session, catalog, ctx).await
        }
    }
}

async fn execute<S: CatalogSource>(session: SearchSession, source: S, ctx: &Context) -> Result<()> {
    let mut driver = SearchDriver::new(session, source);

    let spinner = ctx.output.spinner("Searching...");
    let completion = driver.start().await;
    spinner.finish_and_clear();

    let view = driver.session().view();

    if ctx.output.is_json() {
        ctx.output.json(&view);
        return match view.render {
            RenderState::Failed { message } => bail!(message),
            _ => Ok(()),
        };
    }

    if completion.is_none() {
        ctx.output
            .info("Nothing to search for. Add a query, a category or a location.");
        return Ok(());
    }

    match &view.render {
        RenderState::Failed { message } => bail!("{}", message),
        RenderState::NoResults => {
            ctx.output.info("No products match these filters.");
        }
        _ => print_results(&view, ctx),
    }

    print_filters(&view, ctx);
    Ok(())
}

fn print_results(view: &SearchView, ctx: &Context) {
    let p = &view.pagination;
    ctx.output.header(&format!(
        "Showing {}-{} of {} (page {} of {})",
        p.start_item(),
        p.end_item(),
        p.total,
        p.page,
        p.total_pages
    ));

    let widths = [8, 32, 16, 14, 18];
    ctx.output
        .table_row(&["ID", "NAME", "PRICE", "CATEGORY", "LOCATION"], &widths);
    for item in &view.items {
        let name = if item.is_promoted() {
            format!("★ {}", item.name)
        } else {
            item.name.clone()
        };
        let cols = [
            truncate(item.id.as_str(), widths[0]),
            truncate(&name, widths[1]),
            format_price(item.price, &item.currency),
            truncate(&item.category, widths[3]),
            truncate(&item.seller.location, widths[4]),
        ];
        let cols: Vec<&str> = cols.iter().map(String::as_str).collect();
        ctx.output.table_row(&cols, &widths);
    }

    if p.has_more {
        ctx.output
            .info(&format!("More results available: --page {}", p.page + 1));
    }
}

fn print_filters(view: &SearchView, ctx: &Context) {
    if !view.chips.is_empty() {
        ctx.output.header("Active filters");
        for chip in &view.chips {
            ctx.output.list_item(&chip.label);
        }
    }
    ctx.output.kv("link", &view.href);
}
