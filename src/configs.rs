use anyhow::{Context, Result};
use log::{info, warn};

use crate::cli::{ConfigSaveArgs, ConfigsAction, ConfigsArgs};
use crate::export::ExportConfig;
use crate::mapping::MappingSpec;
use crate::store::{ConfigStore, JsonFileStore, ProjectConfig};
use crate::table;

pub fn execute(args: &ConfigsArgs) -> Result<()> {
    let mut store = JsonFileStore::new(&args.store);
    match &args.action {
        ConfigsAction::List => list(&store),
        ConfigsAction::Show(show) => show_config(&store, &show.id),
        ConfigsAction::Save(save) => save_config(&mut store, save),
        ConfigsAction::Delete(delete) => delete_config(&mut store, &delete.id),
    }
}

fn list(store: &JsonFileStore) -> Result<()> {
    let configs = store.list()?;
    if configs.is_empty() {
        info!("Config store is empty");
        return Ok(());
    }
    let headers: Vec<String> = ["id", "name", "description", "mappings", "format", "updated"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows: Vec<Vec<String>> = configs
        .iter()
        .map(|config| {
            vec![
                config.id.clone(),
                config.name.clone(),
                config.description.clone().unwrap_or_default(),
                config.spec.mappings.len().to_string(),
                config.export_config.format.to_string(),
                config.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        })
        .collect();
    print!("{}", table::render_table(&headers, &rows));
    Ok(())
}

fn show_config(store: &JsonFileStore, id: &str) -> Result<()> {
    let config = store
        .load(id)?
        .with_context(|| format!("No configuration with id '{id}'"))?;
    let rendered = serde_json::to_string_pretty(&config).context("Serializing configuration")?;
    println!("{rendered}");
    Ok(())
}

fn save_config(store: &mut JsonFileStore, args: &ConfigSaveArgs) -> Result<()> {
    let spec = MappingSpec::load(&args.spec)?;
    let export_config = ExportConfig {
        format: args.format,
        include_headers: !args.omit_headers,
        sheet_name: args.sheet_name.clone(),
    };
    let config = ProjectConfig::new(
        args.name.clone(),
        args.description.clone(),
        spec,
        export_config,
    );
    let id = config.id.clone();
    store.save(config)?;
    info!("Saved configuration '{}' with id {id}", args.name);
    println!("{id}");
    Ok(())
}

fn delete_config(store: &mut JsonFileStore, id: &str) -> Result<()> {
    if store.delete(id)? {
        info!("Deleted configuration {id}");
    } else {
        warn!("No configuration with id '{id}' to delete");
    }
    Ok(())
}
