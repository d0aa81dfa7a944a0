//! xmbkit - convert XMB binary containers to XML and back.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use xmbkit_codec::{inspect, FormatProfile, XmbHeader, XmbTree};
use xmbkit_common::Endian;

/// Convert XMB binary containers to XML and back
#[derive(Parser)]
#[command(name = "xmbkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file; .xml encodes to binary, anything else decodes to XML
    file: PathBuf,

    /// Print header and entry information instead of converting
    #[arg(short = 'i', long = "showinfo")]
    showinfo: bool,

    /// Read and write multi-byte values as big-endian
    #[arg(short = 'b', long = "bigendian", visible_alias = "be")]
    bigendian: bool,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Format revision to assume
    #[arg(short, long, value_enum, default_value = "tagged")]
    revision: Revision,
}

#[derive(Clone, Copy, ValueEnum)]
enum Revision {
    /// Parent-index linking, node map, attribute properties
    Tagged,
    /// Reordered header, sibling-run linking, child-element properties
    Legacy,
}

impl Revision {
    fn profile(self, bigendian: bool) -> FormatProfile {
        let profile = match self {
            Revision::Tagged => FormatProfile::TAGGED,
            Revision::Legacy => FormatProfile::LEGACY,
        };
        if bigendian {
            profile.with_endian(Endian::Big)
        } else {
            profile
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let profile = cli.revision.profile(cli.bigendian);

    let is_xml = cli
        .file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));

    if is_xml {
        cmd_encode(&cli.file, cli.output.as_deref(), &profile)
    } else if cli.showinfo {
        cmd_showinfo(&cli.file, &profile)
    } else {
        cmd_decode(&cli.file, cli.output.as_deref(), &profile)
    }
}

fn cmd_decode(input: &Path, output: Option<&Path>, profile: &FormatProfile) -> Result<()> {
    let data =
        fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    if !XmbHeader::is_xmb(&data) {
        bail!("{} is not an XMB container", input.display());
    }

    let tree = XmbTree::decode(&data, profile)
        .with_context(|| format!("failed to decode {}", input.display()))?;
    let xml = tree.to_xml_string(profile.properties)?;

    match output {
        Some(path) => fs::write(path, xml)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", xml),
    }
    Ok(())
}

fn cmd_encode(input: &Path, output: Option<&Path>, profile: &FormatProfile) -> Result<()> {
    let xml = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let tree = XmbTree::from_xml(&xml)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    let bytes = tree.encode(profile)?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("xmb"),
    };
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_showinfo(input: &Path, profile: &FormatProfile) -> Result<()> {
    let data =
        fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let info = inspect(&data, profile)
        .with_context(|| format!("failed to decode {}", input.display()))?;

    let header = &info.header;
    println!("Entries:      {:#x}", header.num_entries);
    println!("Values:       {:#x}", header.num_values);
    println!("Names:        {:#x}", header.num_names);
    println!("Mapped nodes: {:#x}", header.num_mapped);
    println!("Offset index: {:#x}", header.str_offsets_pos);
    println!("Entry table:  {:#x}", header.entries_pos);
    println!("Prop table:   {:#x}", header.properties_pos);
    println!("Node map:     {:#x}", header.node_map_pos);
    println!("Name blob:    {:#x}", header.names_pos);
    println!("Value blob:   {:#x}", header.values_pos);
    println!();

    for (index, (name, record)) in info.entries.iter().enumerate() {
        println!(
            "{}: {}({}, {}, {}, {}, {}, {})",
            index,
            name,
            record.num_props,
            record.num_children,
            record.first_prop,
            record.unk1,
            record.parent_index,
            record.unk2
        );
    }
    Ok(())
}
