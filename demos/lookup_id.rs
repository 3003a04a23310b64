use pcislot::{parse_hex_id, parse_hex_u8, Database, NameResolver};

use anyhow::{Context, Result};

#[derive(structopt::StructOpt)]
struct Args {
    #[structopt(long = "pci-ids-file")]
    #[cfg_attr(
        target_os = "linux",
        structopt(default_value = "/usr/share/misc/pci.ids")
    )]
    #[cfg_attr(target_os = "redox", structopt(default_value = "/share/misc/pci.ids"))]
    pci_ids_file: String,

    #[structopt(subcommand)]
    subcommand: Subcommand,
}

fn parse_from_hex_u8(src: &str) -> Result<u8> {
    Ok(parse_hex_u8(src)?)
}

fn parse_from_hex_u16(src: &str) -> Result<u16> {
    Ok(parse_hex_id(src)?)
}

#[derive(Debug, PartialEq, structopt::StructOpt)]
enum Subcommand {
    Device(Device),
    Class(Class),
}

#[derive(Debug, PartialEq, structopt::StructOpt)]
struct Device {
    #[structopt(parse(try_from_str = parse_from_hex_u16))]
    vendor: u16,

    #[structopt(parse(try_from_str = parse_from_hex_u16))]
    device: Option<u16>,

    #[structopt(parse(try_from_str = parse_from_hex_u16))]
    subsystem_vendor: Option<u16>,

    #[structopt(parse(try_from_str = parse_from_hex_u16))]
    subsystem_device: Option<u16>,
}

#[derive(Debug, PartialEq, structopt::StructOpt)]
struct Class {
    #[structopt(parse(try_from_str = parse_from_hex_u8))]
    class: u8,

    #[structopt(parse(try_from_str = parse_from_hex_u8))]
    subclass: Option<u8>,

    #[structopt(parse(try_from_str = parse_from_hex_u8))]
    prog_interface: Option<u8>,
}

#[paw::main]
fn main(args: Args) -> Result<()> {
    pretty_env_logger::init();

    let database = Database::open(&args.pci_ids_file)
        .with_context(|| format!("Cannot load {}", args.pci_ids_file))?;
    let resolver = NameResolver::new(&database);

    match args.subcommand {
        Subcommand::Device(d) => print_device(d, resolver),
        Subcommand::Class(c) => print_class(c, resolver),
    };
    Ok(())
}

fn print_device(device_args: Device, resolver: NameResolver) {
    let mut msg = format!(
        "Looking up vendor[:device][ subvendor:subdevice]: {:04x}",
        device_args.vendor
    );
    if let Some(device) = device_args.device {
        msg.push_str(&format!(":{:04x}", device));
    }
    if let (Some(subvendor), Some(subdevice)) =
        (device_args.subsystem_vendor, device_args.subsystem_device)
    {
        msg.push_str(&format!(" {:04x}:{:04x}", subvendor, subdevice));
    }
    println!("{}", msg);

    println!("Vendor name: {}", resolver.lookup_vendor_name(device_args.vendor));
    if let Some(device) = device_args.device {
        println!(
            "Device name: {}",
            resolver.lookup_device_name(device_args.vendor, device)
        );
        if let (Some(subvendor), Some(subdevice)) =
            (device_args.subsystem_vendor, device_args.subsystem_device)
        {
            println!(
                "Subsystem name: {}",
                resolver.lookup_subsystem_device_name(
                    device_args.vendor,
                    device,
                    subvendor,
                    subdevice
                )
            );
        }
    }
}

fn print_class(class_args: Class, resolver: NameResolver) {
    let mut msg = format!(
        "Looking up class[:subclass][.prog_interface]: {:02x}",
        class_args.class
    );
    if let Some(subclass) = class_args.subclass {
        msg.push_str(&format!(":{:02x}", subclass));
        if let Some(prog_interface) = class_args.prog_interface {
            msg.push_str(&format!(".{:02x}", prog_interface));
        }
    }
    println!("{}", msg);

    println!("Class name: {}", resolver.lookup_class_name(class_args.class));
    if let Some(subclass) = class_args.subclass {
        println!(
            "Subclass name: {}",
            resolver.lookup_subclass_name(class_args.class, subclass)
        );
        if let Some(prog_interface) = class_args.prog_interface {
            println!(
                "Programming interface name: {}",
                resolver.lookup_prog_if_name(class_args.class, subclass, prog_interface)
            );
        }
    }
}
