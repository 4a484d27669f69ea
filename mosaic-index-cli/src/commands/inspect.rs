//! `inspect` command: print a mosaic's descriptor and footprints.

use mosaic_index::config::ConfigFile;
use mosaic_index::index::{MosaicDescriptor, DESCRIPTOR_EXTENSION};
use mosaic_index::shapefile::{read_dataset, StoredDataset};

use super::common::{resolve_name, MosaicArgs};
use crate::error::CliError;

/// Run the inspect command.
pub fn run(args: MosaicArgs, config: ConfigFile) -> Result<(), CliError> {
    let name = resolve_name(&args, &config)?;
    let descriptor_path = args
        .dir
        .join(format!("{}.{}", name, DESCRIPTOR_EXTENSION));

    let descriptor = MosaicDescriptor::load(&descriptor_path)?;
    let dataset = read_dataset(&args.dir, &name)?;

    print_descriptor(&descriptor);
    println!();
    print_dataset(&dataset);
    Ok(())
}

fn print_descriptor(descriptor: &MosaicDescriptor) {
    println!("Mosaic:      {}", descriptor.name);
    println!(
        "Levels:      {} ({} level{})",
        descriptor.levels_value(),
        descriptor.level_count,
        if descriptor.level_count == 1 { "" } else { "s" }
    );
    println!("Location:    {}", descriptor.location_attribute);
    println!(
        "Time:        {}",
        descriptor.time_attribute.as_deref().unwrap_or("(not indexed)")
    );
}

fn print_dataset(dataset: &StoredDataset) {
    println!("Footprints:  {}", dataset.records.len());
    println!("Envelope:    {}", dataset.bbox);
    if let Some(projection) = &dataset.projection {
        let summary: String = projection.chars().take(60).collect();
        let ellipsis = if projection.chars().count() > 60 { "..." } else { "" };
        println!("Projection:  {}{}", summary, ellipsis);
    }
    println!();

    for (i, record) in dataset.records.iter().enumerate() {
        let geometry = record
            .geometry
            .map(|e| e.to_string())
            .unwrap_or_else(|| "(no geometry)".to_string());
        let time = record
            .time
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("{:>5}  {:<32} {} {}", i + 1, record.location, geometry, time);
    }
}
