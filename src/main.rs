use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;

use san_grid::api_client::HttpPersistenceAdapter;
use san_grid::clipboard::SystemClipboard;
use san_grid::config::{Config, PreferenceBackend};
use san_grid::data::column::infer_columns;
use san_grid::data::filter::{ColumnFilter, FilterOperator};
use san_grid::data::sort::SortDirection;
use san_grid::logging;
use san_grid::preferences::{
    FilePreferencesStore, PreferenceAutosave, PreferenceKey, PreferencesStore,
    RemotePreferencesStore,
};
use san_grid::state::pagination::PageSize;
use san_grid::state::selection::CellCoord;
use san_grid::GridController;
use tracing::{info, warn};

#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    url: Option<String>,
    entity: Option<String>,
    page: Option<usize>,
    page_size: Option<PageSize>,
    search: Option<String>,
    filters: Vec<(String, ColumnFilter)>,
    sort: Option<(String, SortDirection)>,
    copy: bool,
    verbose: bool,
    generate_config: bool,
    help: bool,
}

impl CliOptions {
    fn parse(args: &[String]) -> Result<Self> {
        let mut options = CliOptions::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let mut value = |flag: &str| {
                iter.next()
                    .cloned()
                    .ok_or_else(|| anyhow!("{flag} needs a value"))
            };
            match arg.as_str() {
                "--url" => options.url = Some(value("--url")?),
                "--entity" => options.entity = Some(value("--entity")?),
                "--page" => {
                    let page = value("--page")?;
                    options.page = Some(page.parse().with_context(|| format!("invalid page '{page}'"))?);
                }
                "--page-size" => {
                    options.page_size = Some(value("--page-size")?.parse().map_err(|e: String| anyhow!(e))?)
                }
                "--search" => options.search = Some(value("--search")?),
                "--filter" => options.filters.push(parse_filter(&value("--filter")?)?),
                "--sort" => options.sort = Some(parse_sort(&value("--sort")?)),
                "--copy" => options.copy = true,
                "--verbose" | "-v" => options.verbose = true,
                "--generate-config" => options.generate_config = true,
                "--help" | "-h" => options.help = true,
                other => bail!("unknown argument '{other}'"),
            }
        }
        Ok(options)
    }
}

/// `column:operator[:value]`, or `column:items:a,b,c`
fn parse_filter(spec: &str) -> Result<(String, ColumnFilter)> {
    let mut parts = spec.splitn(3, ':');
    let column = parts.next().unwrap_or_default();
    let operator = parts.next().unwrap_or_default();
    let value = parts.next().unwrap_or_default();
    if column.is_empty() {
        bail!("filter '{spec}' has no column");
    }
    let operator =
        FilterOperator::parse(operator).ok_or_else(|| anyhow!("unknown filter operator '{operator}'"))?;
    let filter = if operator == FilterOperator::Items {
        ColumnFilter::items(value.split(',').map(str::trim).filter(|item| !item.is_empty()))
    } else {
        ColumnFilter::new(operator, value)
    };
    Ok((column.to_string(), filter))
}

/// `column` or `column:desc`
fn parse_sort(spec: &str) -> (String, SortDirection) {
    match spec.rsplit_once(':') {
        Some((column, direction)) if direction.eq_ignore_ascii_case("desc") => {
            (column.to_string(), SortDirection::Desc)
        }
        Some((column, direction)) if direction.eq_ignore_ascii_case("asc") => {
            (column.to_string(), SortDirection::Asc)
        }
        _ => (spec.to_string(), SortDirection::Asc),
    }
}

fn print_help() {
    println!("san-grid - browse an inventory entity through the grid engine");
    println!();
    println!("Usage:");
    println!("  san-grid --entity <name> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --url <base>              API root (default from config)");
    println!("  --entity <name>           Entity to list, e.g. aliases, zones, ports");
    println!("  --page <n>                Page to show (1-based)");
    println!("  --page-size <n|all>       Rows per page");
    println!("  --search <text>           Global search across visible columns");
    println!("  --filter <col:op:value>   Column filter; op is contains, not_contains,");
    println!("                            starts_with, ends_with, equals, not_equals,");
    println!("                            is_empty, is_not_empty or items (a,b,c)");
    println!("  --sort <col[:desc]>       Sort and freeze the order");
    println!("  --copy                    Copy the resolved rows to the clipboard");
    println!("  --verbose, -v             Log to stderr");
    println!("  --generate-config         Print a commented config file");
    println!("  --help, -h                Show this help");
}

fn preferences_store(config: &Config, base_url: &str) -> Result<Arc<dyn PreferencesStore>> {
    Ok(match config.preferences.store {
        PreferenceBackend::File => Arc::new(FilePreferencesStore::new(config.preferences_dir()?)),
        PreferenceBackend::Remote => {
            Arc::new(RemotePreferencesStore::new(base_url, config.api.timeout())?)
        }
    })
}

fn print_page(grid: &GridController) {
    let header: Vec<&str> = grid
        .visible_columns()
        .iter()
        .filter_map(|&index| grid.columns().get(index))
        .map(|column| column.title.as_str())
        .collect();
    println!("{}", header.join("\t"));

    for &index in grid.page_rows() {
        let cells: Vec<String> = grid
            .visible_columns()
            .iter()
            .map(|&col| {
                grid.render_cell(CellCoord::new(index, col))
                    .map(|content| content.text)
                    .unwrap_or_default()
            })
            .collect();
        println!("{}", cells.join("\t"));
    }

    let range = grid.page_range();
    let shown = if range.is_empty() {
        "0".to_string()
    } else {
        format!("{}-{}", range.start + 1, range.end)
    };
    println!();
    println!(
        "{} of {} (page {}/{}, {:?} mode)",
        shown,
        grid.total_count(),
        grid.current_page(),
        grid.total_pages(),
        grid.mode()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match CliOptions::parse(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!();
            print_help();
            std::process::exit(2);
        }
    };

    if options.help {
        print_help();
        return Ok(());
    }
    if options.generate_config {
        print!("{}", Config::create_default_with_comments());
        return Ok(());
    }

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: could not load config ({e}), using defaults");
        Config::default()
    });
    logging::init_tracing(&config.logging.level, options.verbose);

    let Some(entity) = options.entity.clone() else {
        print_help();
        bail!("--entity is required");
    };
    let base_url = options.url.clone().unwrap_or_else(|| config.api.base_url.clone());
    let adapter = HttpPersistenceAdapter::new(&base_url, &entity, config.api.timeout())?
        .with_bulk_save(config.api.bulk_save);

    // Columns are inferred from a one-row probe
    let mut probe = GridController::new(&entity, Vec::new()).with_page_size(PageSize::Count(1));
    probe.reload(&adapter).await?;
    let columns = infer_columns(probe.store().rows());
    info!("Inferred {} columns for {}", columns.len(), entity);

    let mut grid =
        GridController::new(&entity, columns).with_page_size(config.grid.default_page_size);

    let store = preferences_store(&config, &base_url)?;
    let key = PreferenceKey::new(&config.preferences.customer_id, &entity, &config.preferences.user_id);
    match store.get(&key).await {
        Ok(Some(preferences)) => grid.apply_preferences(&preferences),
        Ok(None) => {}
        Err(e) => warn!("Could not read preferences for {}: {}", entity, e),
    }

    if let Some(page_size) = options.page_size {
        grid.set_page_size(page_size);
    }
    if let Some(search) = &options.search {
        grid.set_global_filter(search);
    }
    for (column, filter) in &options.filters {
        grid.set_filter(column, filter.clone())?;
    }
    if let Some((column, direction)) = &options.sort {
        grid.set_sort(column, *direction)?;
    }

    grid.reload(&adapter).await?;
    if let Some(page) = options.page {
        if grid.go_to_page(page).is_needed() {
            grid.reload(&adapter).await?;
        }
    }

    print_page(&grid);

    if options.copy {
        grid.select_all();
        if let Some(text) = grid.copy_selection() {
            SystemClipboard::new()?.set_text(&text)?;
            eprintln!("Copied {} rows to the clipboard", grid.view().row_count());
        }
    }

    let autosave = PreferenceAutosave::spawn(store, config.grid.preference_debounce_ms);
    autosave.schedule(key, grid.preferences());
    autosave.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_command_line() {
        let options = CliOptions::parse(&args(&[
            "--entity", "zones", "--page-size", "all", "--filter", "fabric:eq:F1",
            "--filter", "vsan:items:10, 20", "--sort", "name:desc", "--copy",
        ]))
        .unwrap();
        assert_eq!(options.entity.as_deref(), Some("zones"));
        assert_eq!(options.page_size, Some(PageSize::All));
        assert_eq!(options.filters.len(), 2);
        assert_eq!(options.filters[0].1.operator, FilterOperator::Equals);
        assert_eq!(options.filters[1].1.selected_items, vec!["10", "20"]);
        assert_eq!(options.sort, Some(("name".to_string(), SortDirection::Desc)));
        assert!(options.copy);
    }

    #[test]
    fn test_parse_errors() {
        assert!(CliOptions::parse(&args(&["--page"])).is_err());
        assert!(CliOptions::parse(&args(&["--page-size", "0"])).is_err());
        assert!(CliOptions::parse(&args(&["--filter", "name:like:x"])).is_err());
        assert!(CliOptions::parse(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_parse_sort_and_filter_values_with_colons() {
        assert_eq!(parse_sort("wwpn"), ("wwpn".to_string(), SortDirection::Asc));
        let (column, filter) = parse_filter("wwpn:starts_with:50:01").unwrap();
        assert_eq!(column, "wwpn");
        assert_eq!(filter.value, "50:01");
    }
}
