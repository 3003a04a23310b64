use anyhow::{Context, Result};
use log::LevelFilter;
use pcislot::{Database, IdSource, NameResolver, Slot, SysfsIdSource};

#[derive(structopt::StructOpt)]
struct Args {
    #[structopt(long = "pci-ids-file")]
    #[cfg_attr(
        target_os = "linux",
        structopt(default_value = "/usr/share/misc/pci.ids")
    )]
    #[cfg_attr(target_os = "redox", structopt(default_value = "/share/misc/pci.ids"))]
    pci_ids_file: String,

    #[structopt(long = "sysfs-dir", default_value = "/sys/bus/pci/devices")]
    sysfs_dir: String,

    /// Log what is being read and parsed
    #[structopt(short, long)]
    verbose: bool,

    /// The PCI slot to check. Should be in the format: domain:bus:device.func
    slot: Slot,
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

#[paw::main]
fn main(args: Args) -> Result<()> {
    init_logging(args.verbose);

    let ids = SysfsIdSource::new(&args.sysfs_dir)
        .read_ids(&args.slot)
        .with_context(|| format!("Cannot read the ids of slot {}", args.slot))?;
    log::debug!("ids of {}: {:?}", args.slot, ids);

    let database = Database::open(&args.pci_ids_file)
        .with_context(|| format!("Cannot load {}", args.pci_ids_file))?;
    let names = NameResolver::new(&database).resolve(&ids);

    println!("Vendor Name: {}", names.vendor);
    println!("Device Name: {}", names.device);
    println!("Subsystem Vendor Name: {}", names.subsystem_vendor);
    println!("Subsystem Device Name: {}", names.subsystem_device);
    Ok(())
}
