use std::collections::HashMap;
use std::concat;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context};
use log::{debug, info};
use pest::iterators::Pairs;
use pest::Parser;
use pest_derive::Parser;

use crate::error::{Error, Result};

/// In-memory index of a pci.ids database.
///
/// Vendors keep the order in which they were declared and are also indexed by
/// id. A `Database` is only handed out once the whole source has been
/// consumed and is never mutated afterwards, so it can be shared freely
/// between readers.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Database {
    vendors: Vec<VendorEntry>,
    vendor_index: HashMap<u16, usize>,
    classes: HashMap<u8, ClassEntry>,
}

impl Database {
    /// Opens and parses the pci.ids file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|source| Error::DatabaseUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Reading pci.ids data from {}", path.display());
        Self::from_reader(&mut file)
    }

    /// Parses pci.ids data from a stream.
    ///
    /// Only a failing read is an error. A line that is not valid UTF-8 is
    /// skipped like any other unrecognised line.
    pub fn from_reader(pciids_data_stream: &mut dyn Read) -> Result<Self> {
        let mut unparsed_data = Vec::new();
        pciids_data_stream
            .read_to_end(&mut unparsed_data)
            .map_err(Error::DatabaseFormat)?;

        info!("Parsing pci.ids data!");
        let mut builder = DatabaseBuilder::default();
        for (index, line) in unparsed_data.split(|&byte| byte == b'\n').enumerate() {
            match std::str::from_utf8(line) {
                Ok(line) => builder.add_line(index + 1, line),
                Err(err) => debug!("Skipping line {}: {}", index + 1, err),
            }
        }
        Ok(builder.finish())
    }

    /// Builds a database from pci.ids lines.
    ///
    /// Lines that are not a recognised record are skipped, so this never
    /// fails. When the same key is declared twice at the same level the later
    /// declaration replaces the earlier one.
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        info!("Parsing pci.ids data!");
        let mut builder = DatabaseBuilder::default();
        for (index, line) in lines.into_iter().enumerate() {
            builder.add_line(index + 1, line.as_ref());
        }
        builder.finish()
    }

    pub fn vendor(&self, id: u16) -> Option<&VendorEntry> {
        self.vendor_index.get(&id).map(|&index| &self.vendors[index])
    }

    /// Vendors in declaration order.
    pub fn vendors(&self) -> impl Iterator<Item = &VendorEntry> {
        self.vendors.iter()
    }

    pub fn class(&self, id: u8) -> Option<&ClassEntry> {
        self.classes.get(&id)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassEntry> {
        self.classes.values()
    }

    /// Number of vendors.
    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorEntry {
    id: u16,
    name: String,
    devices: HashMap<u16, DeviceEntry>,
}

impl VendorEntry {
    fn new(id: u16, name: String) -> Self {
        VendorEntry {
            id,
            name,
            devices: HashMap::new(),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device(&self, id: u16) -> Option<&DeviceEntry> {
        self.devices.get(&id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.devices.values()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    id: u16,
    name: String,
    subsystems: HashMap<(u16, u16), String>,
}

impl DeviceEntry {
    fn new(id: u16, name: String) -> Self {
        DeviceEntry {
            id,
            name,
            subsystems: HashMap::new(),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the subsystem declared as `subvendor_id subdevice_id`.
    pub fn subsystem(&self, subvendor_id: u16, subdevice_id: u16) -> Option<&str> {
        self.subsystems
            .get(&(subvendor_id, subdevice_id))
            .map(String::as_str)
    }

    pub fn subsystems(&self) -> impl Iterator<Item = ((u16, u16), &str)> {
        self.subsystems
            .iter()
            .map(|(&ids, name)| (ids, name.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    id: u8,
    name: String,
    subclasses: HashMap<u8, SubclassEntry>,
}

impl ClassEntry {
    fn new(id: u8, name: String) -> Self {
        ClassEntry {
            id,
            name,
            subclasses: HashMap::new(),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subclass(&self, id: u8) -> Option<&SubclassEntry> {
        self.subclasses.get(&id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubclassEntry {
    id: u8,
    name: String,
    prog_interfaces: HashMap<u8, String>,
}

impl SubclassEntry {
    fn new(id: u8, name: String) -> Self {
        SubclassEntry {
            id,
            name,
            prog_interfaces: HashMap::new(),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prog_if(&self, id: u8) -> Option<&str> {
        self.prog_interfaces.get(&id).map(String::as_str)
    }
}

/// Parse state while a database is being built.
///
/// Indented records attach to the most recently declared parent. A record
/// whose parent has not been declared yet is dropped.
#[derive(Default)]
struct DatabaseBuilder {
    database: Database,
    current_vendor: Option<usize>,
    current_device: Option<u16>,
    current_class: Option<u8>,
    current_subclass: Option<u8>,
    num_vendors: usize,
    num_devices: usize,
    num_subsystems: usize,
    num_classes: usize,
}

impl DatabaseBuilder {
    fn add_line(&mut self, number: usize, line: &str) {
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        let record = match PciIdsParser::parse(Rule::line, line) {
            Ok(mut pairs) => match pairs.next().and_then(|line_pair| line_pair.into_inner().next()) {
                Some(record) => record,
                None => return,
            },
            Err(_) => {
                debug!("Skipping line {}: {:?}", number, line);
                return;
            }
        };

        let added = match record.as_rule() {
            Rule::vendor => self.add_vendor_from_vendor_pairs(&mut record.into_inner()),
            Rule::device => self.add_device_from_device_pairs(&mut record.into_inner()),
            Rule::subsystem => self.add_subsystem_from_subsystem_pairs(&mut record.into_inner()),
            Rule::class => self.add_class_from_class_pairs(&mut record.into_inner()),
            Rule::subclass => self.add_subclass_from_subclass_pairs(&mut record.into_inner()),
            Rule::prog_if => self.add_prog_if_from_prog_if_pairs(&mut record.into_inner()),
            Rule::comment | Rule::blank | Rule::EOI => Ok(()),
            _ => unreachable!(),
        };
        if let Err(err) = added {
            debug!("Skipping line {}: {:#}", number, err);
        }
    }

    fn add_vendor_from_vendor_pairs(&mut self, vendor_pairs: &mut Pairs<Rule>) -> anyhow::Result<()> {
        let vendor_id = next_u16(vendor_pairs, "vendor id")?;
        let vendor_name = next_name(vendor_pairs, "vendor name")?;
        debug!("vendor: {:04x} {}", vendor_id, vendor_name);

        let vendor = VendorEntry::new(vendor_id, vendor_name);
        let database = &mut self.database;
        let index = match database.vendor_index.get(&vendor_id) {
            Some(&index) => {
                database.vendors[index] = vendor;
                index
            }
            None => {
                database.vendors.push(vendor);
                let index = database.vendors.len() - 1;
                database.vendor_index.insert(vendor_id, index);
                self.num_vendors += 1;
                index
            }
        };
        self.current_vendor = Some(index);
        self.current_device = None;
        Ok(())
    }

    fn add_device_from_device_pairs(&mut self, device_pairs: &mut Pairs<Rule>) -> anyhow::Result<()> {
        let vendor_index = self
            .current_vendor
            .context("Device declared before any vendor.")?;
        let device_id = next_u16(device_pairs, "device id")?;
        let device_name = next_name(device_pairs, "device name")?;
        debug!("device: {:04x} {}", device_id, device_name);

        self.database.vendors[vendor_index]
            .devices
            .insert(device_id, DeviceEntry::new(device_id, device_name));
        self.current_device = Some(device_id);
        self.num_devices += 1;
        Ok(())
    }

    fn add_subsystem_from_subsystem_pairs(
        &mut self,
        subsystem_pairs: &mut Pairs<Rule>,
    ) -> anyhow::Result<()> {
        let vendor_index = self
            .current_vendor
            .context("Subsystem declared before any vendor.")?;
        let device_id = self
            .current_device
            .context("Subsystem declared before any device.")?;

        let subsystem_id_pair = subsystem_pairs
            .next()
            .ok_or(anyhow!("No subsystem id found."))?;
        let mut subsystem_id_inners = match subsystem_id_pair.as_rule() {
            Rule::subsystem_id => Ok(subsystem_id_pair.into_inner()),
            _ => Err(anyhow!("Tried to add non subsystem to subsystem data.")),
        }?;
        let subvendor_id = next_u16(&mut subsystem_id_inners, "subvendor id")?;
        let subdevice_id = next_u16(&mut subsystem_id_inners, "subdevice id")?;
        let subsystem_name = next_name(subsystem_pairs, "subsystem name")?;
        debug!(
            "subsystem: {:04x} {:04x} {}",
            subvendor_id, subdevice_id, subsystem_name
        );

        let device = self.database.vendors[vendor_index]
            .devices
            .get_mut(&device_id)
            .ok_or(anyhow!("Device {:04x} is not indexed.", device_id))?;
        device
            .subsystems
            .insert((subvendor_id, subdevice_id), subsystem_name);
        self.num_subsystems += 1;
        Ok(())
    }

    fn add_class_from_class_pairs(&mut self, class_pairs: &mut Pairs<Rule>) -> anyhow::Result<()> {
        let class_id = next_u8(class_pairs, "class id")?;
        let class_name = next_name(class_pairs, "class name")?;
        debug!("class: {:02x} {}", class_id, class_name);

        self.database
            .classes
            .insert(class_id, ClassEntry::new(class_id, class_name));
        self.current_class = Some(class_id);
        self.current_subclass = None;
        self.num_classes += 1;
        Ok(())
    }

    fn add_subclass_from_subclass_pairs(
        &mut self,
        subclass_pairs: &mut Pairs<Rule>,
    ) -> anyhow::Result<()> {
        let class_id = self
            .current_class
            .context("Subclass declared before any class.")?;
        let subclass_id = next_u8(subclass_pairs, "subclass id")?;
        let subclass_name = next_name(subclass_pairs, "subclass name")?;
        debug!("subclass: {:02x} {}", subclass_id, subclass_name);

        let class = self
            .database
            .classes
            .get_mut(&class_id)
            .ok_or(anyhow!("Class {:02x} is not indexed.", class_id))?;
        class
            .subclasses
            .insert(subclass_id, SubclassEntry::new(subclass_id, subclass_name));
        self.current_subclass = Some(subclass_id);
        Ok(())
    }

    fn add_prog_if_from_prog_if_pairs(
        &mut self,
        prog_if_pairs: &mut Pairs<Rule>,
    ) -> anyhow::Result<()> {
        let class_id = self
            .current_class
            .context("Programming interface declared before any class.")?;
        let subclass_id = self
            .current_subclass
            .context("Programming interface declared before any subclass.")?;
        let prog_if_id = next_u8(prog_if_pairs, "programming interface id")?;
        let prog_if_name = next_name(prog_if_pairs, "programming interface name")?;
        debug!("prog_if: {:02x} {}", prog_if_id, prog_if_name);

        let subclass = self
            .database
            .classes
            .get_mut(&class_id)
            .and_then(|class| class.subclasses.get_mut(&subclass_id))
            .ok_or(anyhow!(
                "Subclass {:02x}:{:02x} is not indexed.",
                class_id,
                subclass_id
            ))?;
        subclass.prog_interfaces.insert(prog_if_id, prog_if_name);
        Ok(())
    }

    fn finish(self) -> Database {
        info!(
            concat!(
                "Number of objects imported from the pci.ids database: ",
                "vendors({}), devices({}), subsystems({}) and classes({})",
            ),
            self.num_vendors, self.num_devices, self.num_subsystems, self.num_classes
        );
        self.database
    }
}

fn next_str<'i>(pairs: &mut Pairs<'i, Rule>, what: &str) -> anyhow::Result<&'i str> {
    pairs
        .next()
        .map(|pair| pair.as_str())
        .ok_or_else(|| anyhow!("No {} found.", what))
}

fn next_u16(pairs: &mut Pairs<Rule>, what: &str) -> anyhow::Result<u16> {
    let id = next_str(pairs, what)?;
    u16::from_str_radix(id, 16).with_context(|| format!("Invalid {}: {}", what, id))
}

fn next_u8(pairs: &mut Pairs<Rule>, what: &str) -> anyhow::Result<u8> {
    let id = next_str(pairs, what)?;
    u8::from_str_radix(id, 16).with_context(|| format!("Invalid {}: {}", what, id))
}

fn next_name(pairs: &mut Pairs<Rule>, what: &str) -> anyhow::Result<String> {
    Ok(next_str(pairs, what)?.trim().to_owned())
}

#[derive(Parser)]
#[grammar = "pciids.pest"]
pub(crate) struct PciIdsParser;
