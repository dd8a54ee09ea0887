use crate::core::report::RowFilter;
use crate::domain::model::{
    AnalysisSummary, ClassifiedRow, OriginDetails, OriginVerdict, ProductAnalysis,
    TariffVulnerability,
};
use std::collections::BTreeMap;
use std::fmt::Write;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 2rem; color: #1f2933; }
h1 { margin-bottom: 0; }
.subtitle { color: #616e7c; margin-top: 0.25rem; }
.cards { display: flex; gap: 1rem; margin: 1.5rem 0; }
.card { flex: 1; border: 1px solid #e4e7eb; border-radius: 8px; padding: 1rem; }
.card .label { color: #616e7c; font-size: 0.85rem; }
.card .value { font-size: 1.8rem; font-weight: 600; }
.card .delta { color: #3e4c59; font-size: 0.85rem; }
.charts { display: flex; gap: 2rem; }
.chart { flex: 1; }
.bar-row { display: flex; align-items: center; margin: 0.25rem 0; }
.bar-label { width: 6rem; }
.bar { background: #2680c2; height: 1rem; margin-right: 0.5rem; }
table { border-collapse: collapse; width: 100%; margin-top: 1rem; }
th, td { border-bottom: 1px solid #e4e7eb; padding: 0.4rem 0.6rem; text-align: left; vertical-align: top; }
.verdict-Yes { color: #cf1124; font-weight: 600; }
.verdict-Unclear { color: #cb6e17; }
.verdict-No { color: #199473; }
form { margin: 1rem 0; }
"#;

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

fn metric_card(out: &mut String, label: &str, value: &str, delta: &str) {
    let _ = write!(
        out,
        "<div class=\"card\"><div class=\"label\">{}</div><div class=\"value\">{}</div>\
         <div class=\"delta\">{}</div></div>",
        escape_html(label),
        escape_html(value),
        escape_html(delta)
    );
}

fn bar_chart(out: &mut String, heading: &str, counts: &BTreeMap<String, usize>, order: &[&str]) {
    let max = counts.values().copied().max().unwrap_or(0).max(1);
    let _ = write!(out, "<div class=\"chart\"><h3>{}</h3>", escape_html(heading));
    for key in order {
        let count = counts.get(*key).copied().unwrap_or(0);
        let width = count * 300 / max;
        let _ = write!(
            out,
            "<div class=\"bar-row\"><span class=\"bar-label\">{}</span>\
             <span class=\"bar\" style=\"width:{}px\"></span><span>{}</span></div>",
            escape_html(key),
            width,
            count
        );
    }
    out.push_str("</div>");
}

fn select(out: &mut String, name: &str, label: &str, options: &[&str], selected: Option<&str>) {
    let _ = write!(out, "<label>{} <select name=\"{}\">", escape_html(label), name);
    for option in std::iter::once("All").chain(options.iter().copied()) {
        let is_selected = selected.unwrap_or("All") == option;
        let _ = write!(
            out,
            "<option value=\"{0}\"{1}>{0}</option>",
            escape_html(option),
            if is_selected { " selected" } else { "" }
        );
    }
    out.push_str("</select></label> ");
}

/// Bulk results page: metric cards, breakdown bars, filter form and the
/// filtered table. `summary` describes the unfiltered rows.
pub fn render_dashboard(
    rows: &[ClassifiedRow],
    summary: &AnalysisSummary,
    filter: &RowFilter,
) -> String {
    let mut body = String::new();
    body.push_str("<h1>🛡️ TariffHunter</h1>\n");
    body.push_str("<p class=\"subtitle\">Product sourcing risk analysis</p>\n");

    body.push_str("<div class=\"cards\">");
    metric_card(
        &mut body,
        "Total Products",
        &summary.total_products.to_string(),
        "",
    );
    metric_card(
        &mut body,
        "China-Sourced",
        &summary.china_sourced.to_string(),
        &format!("{:.1}%", summary.china_sourced_pct),
    );
    metric_card(
        &mut body,
        "High Tariff Risk",
        &summary.high_risk.to_string(),
        &summary
            .high_risk_pct_of_china
            .map(|pct| format!("{:.1}% of China-sourced", pct))
            .unwrap_or_else(|| "N/A".to_string()),
    );
    body.push_str("</div>\n");

    let origin_order: Vec<&str> = OriginVerdict::ALL.iter().map(|v| v.as_str()).collect();
    let risk_order: Vec<&str> = TariffVulnerability::ALL.iter().map(|v| v.as_str()).collect();
    body.push_str("<div class=\"charts\">");
    bar_chart(&mut body, "Origin Breakdown", &summary.origin_breakdown, &origin_order);
    bar_chart(&mut body, "Risk Profile", &summary.risk_breakdown, &risk_order);
    body.push_str("</div>\n");

    body.push_str("<form method=\"get\" action=\"/\">");
    select(
        &mut body,
        "made_in_china",
        "Made in China",
        &origin_order,
        filter.made_in_china.map(|v| v.as_str()),
    );
    select(
        &mut body,
        "vulnerability",
        "Tariff vulnerability",
        &risk_order,
        filter.vulnerability.map(|v| v.as_str()),
    );
    body.push_str("<button type=\"submit\">Apply</button> ");
    let _ = writeln!(
        body,
        "<a href=\"/download.csv?{}\">📥 Download Filtered Results</a></form>",
        escape_html(&filter.query_string())
    );

    let visible: Vec<&ClassifiedRow> = rows.iter().filter(|row| filter.matches(row)).collect();
    let _ = writeln!(
        body,
        "<p>Showing {} of {} products</p>",
        visible.len(),
        rows.len()
    );
    body.push_str(
        "<table><thead><tr><th>Title</th><th>Price</th><th>Made in China</th>\
         <th>Vulnerability</th><th>Likely origin</th><th>Alternative sourcing</th></tr></thead><tbody>",
    );
    for row in visible {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>${:.2}</td><td class=\"verdict-{}\">{}</td><td>{}</td>\
             <td>{}</td><td>{}</td></tr>",
            escape_html(&row.title),
            row.price,
            row.made_in_china.as_str(),
            row.made_in_china.as_str(),
            row.tariff_vulnerability.as_str(),
            escape_html(row.likely_origin.as_deref().unwrap_or("")),
            escape_html(&row.alt_sourcing)
        );
    }
    body.push_str("</tbody></table>\n");

    page("TariffHunter Dashboard", &body)
}

/// Single-product report with origin, sales and sourcing sections.
pub fn render_product_report(analysis: &ProductAnalysis) -> String {
    let origin = &analysis.origin;
    let sales = &analysis.sales;
    let sourcing = &analysis.sourcing;
    let mut body = String::new();

    let _ = writeln!(
        body,
        "<h1>📋 Analysis Report: {}</h1>",
        escape_html(&analysis.product.title)
    );

    body.push_str("<div class=\"cards\">");
    metric_card(
        &mut body,
        "China Origin Likelihood",
        origin.made_in_china.as_str(),
        &format!("{:.1}% confidence", origin.confidence * 100.0),
    );
    metric_card(
        &mut body,
        "Tariff Risk",
        analysis.tariff_vulnerability.as_str(),
        if analysis.tariff_vulnerability == TariffVulnerability::High {
            "Consider alternatives"
        } else {
            "Low risk"
        },
    );
    metric_card(
        &mut body,
        "Estimated Monthly Sales",
        &sales.estimated_monthly_sales.to_string(),
        &format!("BSR: {}", sales.best_seller_rank),
    );
    body.push_str("</div>\n");

    body.push_str("<h2>🛃 Origin Analysis</h2>\n<ul>");
    match &origin.details {
        OriginDetails::China(details) => {
            body.push_str("<li><strong>Likely Manufactured in China</strong></li>");
            if let Some(province) = &details.likely_province {
                let _ = write!(
                    body,
                    "<li>Probable Province: {}</li>",
                    escape_html(province)
                );
            }
            if details.factory_mentioned || details.supplier_mentioned {
                body.push_str("<li>✅ Factory/supplier mentioned in description</li>");
            }
            if let Some(phrases) = &details.origin_phrases {
                let _ = write!(
                    body,
                    "<li>Origin Phrases Found: {}</li>",
                    escape_html(phrases)
                );
            }
        }
        OriginDetails::Elsewhere(other) => {
            body.push_str("<li><strong>Not Likely Manufactured in China</strong></li>");
            if other.likely_country != "Unknown" {
                let _ = write!(
                    body,
                    "<li>Possible Origin: {}</li>",
                    escape_html(&other.likely_country)
                );
            }
            if !other.likely_cities.is_empty() {
                let _ = write!(
                    body,
                    "<li>Cities mentioned: {}</li>",
                    escape_html(&other.likely_cities.join(", "))
                );
            }
        }
    }
    let _ = write!(
        body,
        "<li>Production Type: {}</li><li>Supplier Tier: {}</li>\
         <li>Analysis Confidence: {:.1}%</li></ul>\n",
        origin.production_type(),
        origin.supplier_tier(),
        origin.confidence * 100.0
    );

    body.push_str("<h2>📊 Sales Metrics</h2>\n<ul>");
    let _ = write!(
        body,
        "<li>Current Price: ${:.2}</li><li>Estimated Monthly Sales: {}</li>\
         <li>Best Seller Rank: {}</li><li>Average Rating: {:.1} ⭐ ({} reviews)</li>\
         <li>In stock: {}</li><li>Source: {:?}</li></ul>\n",
        sales.current_price,
        sales.estimated_monthly_sales,
        sales.best_seller_rank,
        sales.average_rating,
        sales.review_count,
        if sales.in_stock { "yes" } else { "no" },
        sales.source
    );
    if !sales.price_history.is_empty() {
        body.push_str("<h3>Price History</h3><table><thead><tr><th>Month</th><th>Price</th></tr></thead><tbody>");
        for point in &sales.price_history {
            let _ = write!(
                body,
                "<tr><td>{}</td><td>${:.2}</td></tr>",
                escape_html(&point.date),
                point.price
            );
        }
        body.push_str("</tbody></table>\n");
    }

    body.push_str("<h2>🌍 Sourcing Alternatives</h2>\n");
    if origin.made_in_china == OriginVerdict::No {
        body.push_str(
            "<p>This product doesn't appear to be China-sourced. No alternatives needed.</p>\n",
        );
    }
    let _ = writeln!(
        body,
        "<p>{}{}</p>",
        escape_html(&sourcing.suggestion_text),
        if sourcing.ai_generated {
            " (model suggestion)"
        } else {
            ""
        }
    );
    if !sourcing.country_comparisons.is_empty() {
        body.push_str(
            "<h3>Cost Comparison</h3><table><thead><tr><th>Country</th><th>Estimated Cost</th>\
             <th>Tariff</th><th>Landed Cost</th><th>Lead Time</th><th>Labor Cost Index</th></tr></thead><tbody>",
        );
        for comparison in &sourcing.country_comparisons {
            let _ = write!(
                body,
                "<tr><td>{}</td><td>${:.2}</td><td>{:.0}%</td><td>${:.2}</td><td>{}</td>\
                 <td>{:.0}% of China</td></tr>",
                escape_html(&comparison.country),
                comparison.estimated_cost,
                comparison.tariff_rate * 100.0,
                comparison.landed_cost,
                escape_html(&comparison.lead_time),
                comparison.labor_cost_index * 100.0
            );
        }
        body.push_str("</tbody></table>\n");
    }
    if let Some(savings) = &sourcing.cost_savings {
        let _ = writeln!(
            body,
            "<p>Best alternative: <strong>{}</strong>, saving ${:.2} per unit ({:.1}%)</p>",
            escape_html(&savings.best_alternative),
            savings.saving_per_unit,
            savings.potential_saving_pct
        );
    }
    if !sourcing.key_considerations.is_empty() {
        body.push_str("<h3>Key Considerations</h3><ul>");
        for consideration in &sourcing.key_considerations {
            let _ = write!(body, "<li>{}</li>", escape_html(consideration));
        }
        body.push_str("</ul>\n");
    }

    page(
        &format!("TariffHunter: {}", analysis.product.title),
        &body,
    )
}
