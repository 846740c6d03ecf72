//! Renders a compiled [`QueryRequest`] as a PostgREST call.
//!
//! ```text
//! GET /products?select=*,shops(name,location)
//!     &or=(name.ilike.*shoe*,description.ilike.*shoe*)
//!     &category=in.("Electronics","Fashion")
//!     &price=gte.0&price=lte.10000000
//!     &order=id.desc&offset=0&limit=12
//! Range-Unit: items
//! Range: 0-11
//! Prefer: count=exact
//! ```
//!
//! A filter on an embedded column such as `shops.location` only prunes the
//! embedded rows unless the embed is an inner join, so [`render`] rewrites
//! `shops(..)` to `shops!inner(..)` whenever the request filters on it.

use market_search::compiler::{CountMode, Predicate, QueryRequest};

/// Characters with meaning inside PostgREST logical and list operators.
const RESERVED: &[char] = &[',', '.', ':', '(', ')', '"', '\\', ' '];

/// Query parameters for `request`, in a stable order.
pub fn render(request: &QueryRequest, select: &str) -> Vec<(String, String)> {
    let predicates = request.predicates();
    let select = filtered_embeds(&predicates)
        .into_iter()
        .fold(select.to_string(), |select, (embed, column)| {
            inner_join(&select, embed, column)
        });
    let mut params = vec![("select".to_string(), select)];

    for predicate in predicates {
        match &predicate {
            Predicate::AnyOf(inner) => params.push(("or".to_string(), group(inner))),
            other => {
                if let Some(pair) = top_level(other) {
                    params.push(pair);
                }
            }
        }
    }

    let direction = if request.order.descending { "desc" } else { "asc" };
    params.push((
        "order".to_string(),
        format!("{}.{}", request.order.field.column(), direction),
    ));
    params.push(("offset".to_string(), request.range.start.to_string()));
    params.push(("limit".to_string(), request.range.size().to_string()));
    params
}

/// Range and count headers for `request`.
pub fn headers(request: &QueryRequest) -> Vec<(&'static str, String)> {
    let mut headers = vec![
        ("Range-Unit", "items".to_string()),
        (
            "Range",
            format!("{}-{}", request.range.start, request.range.end),
        ),
    ];
    match request.count {
        CountMode::Exact => headers.push(("Prefer", "count=exact".to_string())),
    }
    headers
}

fn top_level(predicate: &Predicate) -> Option<(String, String)> {
    let (column, condition) = match predicate {
        Predicate::ILike { field, needle } => (field.column(), format!("ilike.{}", pattern(needle))),
        Predicate::In { field, values } => (field.column(), format!("in.{}", list(values))),
        Predicate::Gte { field, value } => (field.column(), format!("gte.{}", value)),
        Predicate::Lte { field, value } => (field.column(), format!("lte.{}", value)),
        Predicate::AnyOf(_) => return None,
    };
    Some((column.to_string(), condition))
}

/// `(a.op.x,b.op.y)` with operands quoted where needed.
fn group(predicates: &[Predicate]) -> String {
    let parts: Vec<String> = predicates.iter().map(nested).collect();
    format!("({})", parts.join(","))
}

fn nested(predicate: &Predicate) -> String {
    match predicate {
        Predicate::AnyOf(inner) => format!("or{}", group(inner)),
        Predicate::ILike { field, needle } => {
            format!("{}.ilike.{}", field.column(), quote(&pattern(needle)))
        }
        Predicate::In { field, values } => format!("{}.in.{}", field.column(), list(values)),
        Predicate::Gte { field, value } => format!("{}.gte.{}", field.column(), value),
        Predicate::Lte { field, value } => format!("{}.lte.{}", field.column(), value),
    }
}

/// `*needle*` with the needle's LIKE metacharacters escaped. PostgREST turns
/// every `*` into `%` and has no escape for it, so a literal `*` goes out as
/// the single-character wildcard `_`.
fn pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('*');
    for c in needle.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            '*' => out.push('_'),
            _ => out.push(c),
        }
    }
    out.push('*');
    out
}

/// `(embed, column)` for every top-level predicate on an embedded column.
fn filtered_embeds(predicates: &[Predicate]) -> Vec<(&'static str, &'static str)> {
    let mut embeds: Vec<(&'static str, &'static str)> = Vec::new();
    for predicate in predicates {
        let field = match predicate {
            Predicate::ILike { field, .. }
            | Predicate::In { field, .. }
            | Predicate::Gte { field, .. }
            | Predicate::Lte { field, .. } => field,
            Predicate::AnyOf(_) => continue,
        };
        if let Some(pair) = field.column().split_once('.') {
            if !embeds.iter().any(|(embed, _)| *embed == pair.0) {
                embeds.push(pair);
            }
        }
    }
    embeds
}

/// Turn the top-level `embed(..)` of a select list into `embed!inner(..)`,
/// appending `embed!inner(column)` when the list does not embed it at all.
fn inner_join(select: &str, embed: &str, column: &str) -> String {
    let mut found = false;
    let items: Vec<String> = split_top_level(select)
        .into_iter()
        .map(|item| {
            let name = item.split('(').next().unwrap_or(item).trim();
            if name == embed {
                found = true;
                item.replacen(embed, &format!("{}!inner", embed), 1)
            } else {
                if name.split('!').next() == Some(embed) {
                    found = true;
                }
                item.to_string()
            }
        })
        .collect();

    let mut select = items.join(",");
    if !found {
        select.push_str(&format!(",{}!inner({})", embed, column));
    }
    select
}

/// Split on commas outside parentheses.
fn split_top_level(select: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in select.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&select[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&select[start..]);
    items
}

fn list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| force_quote(v)).collect();
    format!("({})", quoted.join(","))
}

fn quote(value: &str) -> String {
    if value.contains(RESERVED) {
        force_quote(value)
    } else {
        value.to_string()
    }
}

fn force_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
