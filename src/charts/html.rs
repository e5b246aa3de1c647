//! HTML Chart Writer
//! Builds Vega-Lite stacked bar charts, embeds them in a standalone HTML page
//! and opens the page in the default browser.

use crate::charts::RenderError;
use crate::data::{AgeGroup, DataProcessor, RegionalSpend, SeasonalCount, SEASON_ORDER};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

pub const SEASONAL_TITLE: &str = "Popularity of Product Categories Across Seasons";

/// Name of the age group filter parameter on the regional chart.
const AGE_FILTER_PARAM: &str = "age_filter";
const ALL_AGES: &str = "All";

/// Stack segment shown for every gender when no age group is selected.
const TOTAL_SEGMENT: &str = "Total";
const TOTAL_COLOR: &str = "#4e79a7";
/// Derived field holding the age group, or "Total" when unfiltered.
const SEGMENT_FIELD: &str = "Segment";
/// Derived field holding the summed spend of one bar.
const BAR_TOTAL_FIELD: &str = "TotalPurchase";

/// Vega/D3 category10 palette.
const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

pub struct HtmlChartWriter;

impl HtmlChartWriter {
    /// Stacked bar of purchase counts: seasons on x, stacked by product category.
    pub fn seasonal_spec(counts: &[SeasonalCount]) -> Value {
        let mut season_sort: Vec<String> = SEASON_ORDER.iter().map(|s| s.to_string()).collect();
        for c in counts {
            if DataProcessor::season_rank(&c.season) == SEASON_ORDER.len()
                && !season_sort.contains(&c.season)
            {
                season_sort.push(c.season.clone());
            }
        }

        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": SEASONAL_TITLE,
            "width": 700,
            "height": 400,
            "data": { "values": counts },
            "mark": { "type": "bar" },
            "encoding": {
                "x": {
                    "field": "Season",
                    "type": "nominal",
                    "title": "Season",
                    "sort": season_sort
                },
                "y": {
                    "field": "count",
                    "type": "quantitative",
                    "aggregate": "sum",
                    "title": "Number of Purchases"
                },
                "color": {
                    "field": "Category",
                    "type": "nominal",
                    "title": "Product Category"
                },
                "tooltip": [
                    { "field": "Season", "type": "nominal" },
                    { "field": "Category", "type": "nominal" },
                    { "field": "count", "type": "quantitative", "aggregate": "sum", "title": "count()" }
                ]
            }
        })
    }

    /// Stacked bar of total spend per gender, stacked by age group, with an
    /// age group radio filter and a currency label above each bar.
    ///
    /// With "All" selected each gender is drawn as a single "Total" bar.
    pub fn regional_spec(spend: &[RegionalSpend], location: &str) -> Value {
        let age_groups: Vec<&str> = AgeGroup::ALL.iter().map(|g| g.label()).collect();
        let mut filter_options = vec![ALL_AGES];
        filter_options.extend(age_groups.iter().copied());

        let mut segment_domain = age_groups.clone();
        segment_domain.push(TOTAL_SEGMENT);
        let mut segment_colors: Vec<&str> = CATEGORY10[..age_groups.len()].to_vec();
        segment_colors.push(TOTAL_COLOR);

        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": format!("Total Purchase Amount by Gender and Age Group ({location})"),
            "width": 410,
            "height": 320,
            "data": { "values": spend },
            "params": [{
                "name": AGE_FILTER_PARAM,
                "value": ALL_AGES,
                "bind": {
                    "input": "radio",
                    "options": filter_options,
                    "name": "Filter by Age Group: "
                }
            }],
            "transform": [
                {
                    "filter": format!(
                        "{AGE_FILTER_PARAM} == '{ALL_AGES}' || datum.AgeGroup == {AGE_FILTER_PARAM}"
                    )
                },
                {
                    "calculate": format!(
                        "{AGE_FILTER_PARAM} == '{ALL_AGES}' ? '{TOTAL_SEGMENT}' : datum.AgeGroup"
                    ),
                    "as": SEGMENT_FIELD
                }
            ],
            "encoding": {
                "x": {
                    "field": "Gender",
                    "type": "nominal",
                    "title": "Gender",
                    "axis": { "labelAngle": 0 }
                }
            },
            "layer": [
                {
                    "mark": { "type": "bar" },
                    "encoding": {
                        "y": {
                            "field": "PurchaseAmount",
                            "type": "quantitative",
                            "aggregate": "sum",
                            "title": "Total Purchase Amount (USD)",
                            "axis": { "format": "~s" }
                        },
                        "color": {
                            "field": SEGMENT_FIELD,
                            "type": "nominal",
                            "title": "Age Group",
                            "scale": { "domain": segment_domain, "range": segment_colors }
                        },
                        "order": { "field": SEGMENT_FIELD, "sort": "ascending" },
                        "tooltip": [
                            { "field": "Gender", "type": "nominal" },
                            { "field": SEGMENT_FIELD, "type": "nominal", "title": "Age Group" },
                            { "field": "PurchaseAmount", "type": "quantitative", "aggregate": "sum", "title": "Purchase Amount", "format": "$,.0f" },
                            { "field": "Count", "type": "quantitative", "aggregate": "sum", "title": "Purchases" }
                        ]
                    }
                },
                {
                    "transform": [{
                        "aggregate": [{ "op": "sum", "field": "PurchaseAmount", "as": BAR_TOTAL_FIELD }],
                        "groupby": ["Gender"]
                    }],
                    "mark": { "type": "text", "dy": -5, "fontSize": 10, "color": "#000" },
                    "encoding": {
                        "y": { "field": BAR_TOTAL_FIELD, "type": "quantitative" },
                        "text": { "field": BAR_TOTAL_FIELD, "type": "quantitative", "format": "$,.0f" }
                    }
                }
            ]
        })
    }

    /// Standalone HTML page rendering `spec` with vega-embed.
    pub fn page(title: &str, spec: &Value) -> Result<String, RenderError> {
        // "</" inside the inline script would close the script element.
        let spec_json = serde_json::to_string(spec)?.replace("</", "<\\/");
        let title = title
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");

        Ok(format!(
            r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
</head>
<body>
  <div id="vis"></div>
  <script type="text/javascript">
    vegaEmbed("#vis", {spec_json}, {{"mode": "vega-lite"}}).catch(console.error);
  </script>
</body>
</html>
"##
        ))
    }

    /// Write `html` to `path` and return the file's absolute path.
    pub fn write(path: &Path, html: &str) -> Result<PathBuf, RenderError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, html)?;
        let absolute = fs::canonicalize(path)?;
        info!(path = %absolute.display(), bytes = html.len(), "wrote chart");
        Ok(absolute)
    }

    /// Open a saved chart with the system default application.
    pub fn open_in_browser(path: &Path) -> Result<(), RenderError> {
        debug!(path = %path.display(), "opening in browser");
        open::that(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> Vec<SeasonalCount> {
        vec![
            SeasonalCount {
                season: "Winter".to_string(),
                category: "Clothing".to_string(),
                count: 3,
            },
            SeasonalCount {
                season: "Fall".to_string(),
                category: "Footwear".to_string(),
                count: 2,
            },
            SeasonalCount {
                season: "Unknown".to_string(),
                category: "Footwear".to_string(),
                count: 1,
            },
        ]
    }

    #[test]
    fn seasonal_spec_encodes_stacked_counts() {
        let spec = HtmlChartWriter::seasonal_spec(&counts());

        assert_eq!(spec["title"], SEASONAL_TITLE);
        assert_eq!(spec["width"], 700);
        assert_eq!(spec["height"], 400);
        assert_eq!(spec["encoding"]["y"]["title"], "Number of Purchases");
        assert_eq!(spec["encoding"]["color"]["title"], "Product Category");
        assert_eq!(
            spec["encoding"]["x"]["sort"],
            json!(["Winter", "Spring", "Summer", "Fall", "Unknown"])
        );

        let values = spec["data"]["values"].as_array().unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], json!({"Season": "Winter", "Category": "Clothing", "count": 3}));
    }

    #[test]
    fn regional_spec_binds_age_filter() {
        let spend = vec![RegionalSpend {
            gender: "Male".to_string(),
            age_group: AgeGroup::From31To40,
            amount: 120.0,
            count: 2,
        }];
        let spec = HtmlChartWriter::regional_spec(&spend, "Massachusetts");

        assert_eq!(
            spec["title"],
            "Total Purchase Amount by Gender and Age Group (Massachusetts)"
        );
        let options = spec["params"][0]["bind"]["options"].as_array().unwrap();
        assert_eq!(options.len(), 9);
        assert_eq!(options[0], "All");
        assert_eq!(options[8], "71+");
        assert_eq!(
            spec["transform"][0]["filter"],
            "age_filter == 'All' || datum.AgeGroup == age_filter"
        );
        assert_eq!(spec["data"]["values"][0]["AgeGroup"], "31-40");

        assert_eq!(
            spec["transform"][1]["calculate"],
            "age_filter == 'All' ? 'Total' : datum.AgeGroup"
        );
        let bars = &spec["layer"][0];
        assert_eq!(bars["mark"]["type"], "bar");
        let domain = bars["encoding"]["color"]["scale"]["domain"].as_array().unwrap();
        let range = bars["encoding"]["color"]["scale"]["range"].as_array().unwrap();
        assert_eq!(domain.len(), range.len());
        assert_eq!(domain[8], "Total");
        assert_eq!(range[8], "#4e79a7");
    }

    #[test]
    fn regional_spec_labels_bar_totals() {
        let spec = HtmlChartWriter::regional_spec(&[], "Massachusetts");
        let labels = &spec["layer"][1];

        assert_eq!(labels["mark"]["type"], "text");
        assert_eq!(labels["mark"]["dy"], -5);
        assert_eq!(labels["encoding"]["text"]["format"], "$,.0f");
        assert_eq!(
            labels["transform"][0]["aggregate"][0],
            json!({ "op": "sum", "field": "PurchaseAmount", "as": "TotalPurchase" })
        );
        assert_eq!(labels["transform"][0]["groupby"], json!(["Gender"]));
    }

    #[test]
    fn page_embeds_spec_safely() {
        let spec = json!({ "title": "</script><b>" });
        let html = HtmlChartWriter::page("Sales & <Seasons>", &spec).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Sales &amp; &lt;Seasons&gt;</title>"));
        assert!(html.contains(r##"vegaEmbed("#vis", {"title":"<\/script><b>"}"##));
        assert_eq!(html.matches("</script>").count(), 4);
    }

    #[test]
    fn write_returns_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("charts").join("seasonal_category_popularity.html");

        let saved = HtmlChartWriter::write(&target, "<html></html>").unwrap();
        assert!(saved.is_absolute());
        assert!(saved.ends_with("charts/seasonal_category_popularity.html"));
        assert_eq!(fs::read_to_string(&saved).unwrap(), "<html></html>");
    }

    #[test]
    fn rewriting_produces_identical_output() {
        let spec = HtmlChartWriter::seasonal_spec(&counts());
        let first = HtmlChartWriter::page(SEASONAL_TITLE, &spec).unwrap();
        let second = HtmlChartWriter::page(
            SEASONAL_TITLE,
            &HtmlChartWriter::seasonal_spec(&counts()),
        )
        .unwrap();
        assert_eq!(first, second);
    }
}
