//! `clean` command: remove index artifacts without rebuilding.

use mosaic_index::config::{ConfigFile, IndexConfig};
use mosaic_index::index::MosaicIndex;
use mosaic_index::mosaic::InMemoryMosaic;

use super::common::{resolve_name, MosaicArgs};
use crate::error::CliError;

/// Run the clean command.
pub fn run(args: MosaicArgs, config: ConfigFile) -> Result<(), CliError> {
    let name = resolve_name(&args, &config)?;
    // Cleaning never looks at granules, so there is no need to scan images
    let mosaic = InMemoryMosaic::new(name.as_str(), &args.dir);
    let removed = MosaicIndex::new(&mosaic, IndexConfig::default()).clean()?;

    if removed.is_empty() {
        println!("No index artifacts for '{}' in {}", name, args.dir.display());
    } else {
        println!("Removed {} artifact(s) for '{}':", removed.len(), name);
        for path in &removed {
            println!("  {}", path.display());
        }
    }
    Ok(())
}
