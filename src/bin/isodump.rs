use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use isobox::known_boxes::full_name;
use isobox::{BoxNode, FourCC, Options};

#[derive(Parser, Debug)]
#[command(version, about = "ISOBMFF/MP4/HEIF box tree explorer")]
struct Args {
    /// Input file path
    path: String,

    /// Limit recursion depth for tree output
    #[arg(long, default_value_t = 64)]
    max_depth: usize,

    /// Emit JSON instead of a human-readable tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Hex-dump the raw payload of every box with this 4CC (e.g. --raw hvcC)
    #[arg(long)]
    raw: Option<String>,

    /// Cap the number of dumped bytes per box (0 = entire payload)
    #[arg(long, default_value_t = 0)]
    bytes: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut parser = isobox::Parser::new();
    if args.raw.is_some() {
        // Raw dumping needs payload bytes retained on decoded nodes too.
        parser.add_option(Options::KEEP_PAYLOAD);
    }
    parser
        .parse_file(&args.path)
        .with_context(|| format!("failed to parse {}", args.path))?;
    let file = parser.file().context("parser returned no tree")?;

    if let Some(raw) = &args.raw {
        let target =
            FourCC::from_str(raw).with_context(|| format!("not a 4-character code: {raw}"))?;
        for node in &file.children {
            dump_raw(node, target, args.bytes);
        }
    } else if args.json {
        println!("{}", serde_json::to_string_pretty(file)?);
    } else {
        for node in &file.children {
            print_tree(node, 0, args.max_depth);
        }
    }

    Ok(())
}

fn print_tree(node: &BoxNode, depth: usize, max_depth: usize) {
    if depth > max_depth {
        return;
    }
    let indent = "  ".repeat(depth);
    let mut line = format!(
        "{}{} [{}] offset={} size={}",
        indent,
        node.typ(),
        full_name(node.typ()),
        node.offset(),
        node.size_on_wire()
    );
    let fields = node.fields();
    if !fields.is_empty() {
        let rendered: Vec<String> = fields
            .iter()
            .map(|f| format!("{}={}", f.name, f.value))
            .collect();
        line.push_str(&format!("  {}", rendered.join(" ")));
    }
    println!("{line}");
    for child in &node.children {
        print_tree(child, depth + 1, max_depth);
    }
}

fn dump_raw(node: &BoxNode, target: FourCC, limit: usize) {
    if node.typ() == target {
        print_payload(node, limit);
    }
    for child in &node.children {
        dump_raw(child, target, limit);
    }
}

/// Hex + ASCII view of a node's captured payload, addressed by absolute
/// file offset. Containers carry no payload of their own.
fn print_payload(node: &BoxNode, limit: usize) {
    let Some(bytes) = node.raw.as_deref() else {
        println!("{} offset={} (no payload captured)", node.typ(), node.offset());
        return;
    };
    let shown = if limit == 0 { bytes.len() } else { limit.min(bytes.len()) };
    println!(
        "{} [{}] offset={} payload {} bytes",
        node.typ(),
        full_name(node.typ()),
        node.offset(),
        bytes.len()
    );

    let base = node.header.body_start();
    for (row, chunk) in bytes[..shown].chunks(16).enumerate() {
        let mut hex = String::with_capacity(50);
        let mut ascii = String::with_capacity(16);
        for (i, &b) in chunk.iter().enumerate() {
            if i == 8 {
                hex.push(' ');
            }
            hex.push_str(&format!("{:02x} ", b));
            ascii.push(if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            });
        }
        println!("{:08x}: {:<49} {}", base + (row * 16) as u64, hex.trim_end(), ascii);
    }
    if shown < bytes.len() {
        println!("          ... {} more bytes not shown", bytes.len() - shown);
    }
}
