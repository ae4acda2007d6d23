use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use layerswap::{
    BaseRecord, CandidateAsset, DEFAULT_RATIO_TOLERANCE, LayerContent, Library,
    REPLACE_LAYER_NAME, TemplateRecord, new_record_id, output_file_name, parse, pipeline,
};

#[derive(Parser, Debug)]
#[command(name = "layerswap", version)]
struct Cli {
    /// Library metadata file (JSON).
    #[arg(long, global = true, default_value = "library.json")]
    library: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a document's layer tree and resource table.
    Inspect(InspectArgs),
    /// Substitute an image into an explicit template document.
    Replace(ReplaceArgs),
    /// Match an image against the library and substitute into the best template.
    Auto(AutoArgs),
    /// Manage base canvases.
    #[command(subcommand)]
    Base(BaseCommand),
    /// Manage templates.
    #[command(subcommand)]
    Template(TemplateCommand),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Document to inspect.
    path: PathBuf,
}

#[derive(Parser, Debug)]
struct ReplaceArgs {
    /// Template document.
    #[arg(long)]
    template: PathBuf,

    /// Replacement image (PNG or JPEG).
    #[arg(long)]
    image: PathBuf,

    /// Output document path.
    #[arg(long)]
    out: PathBuf,

    /// Binding name of the placeholder layer.
    #[arg(long, default_value = REPLACE_LAYER_NAME)]
    layer: String,
}

#[derive(Parser, Debug)]
struct AutoArgs {
    /// Candidate image (PNG or JPEG).
    #[arg(long)]
    image: PathBuf,

    /// Directory the finished document is written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Aspect-ratio tolerance, in ratio units.
    #[arg(long, default_value_t = DEFAULT_RATIO_TOLERANCE)]
    tolerance: f64,

    /// Binding name of the placeholder layer.
    #[arg(long, default_value = REPLACE_LAYER_NAME)]
    layer: String,
}

#[derive(Subcommand, Debug)]
enum BaseCommand {
    /// Register a base canvas.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Prefix for output file names produced for this base.
        #[arg(long)]
        prefix: Option<String>,
    },
    /// List base canvases.
    Ls,
    /// Delete a base, its templates, and their backing files.
    Rm {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    /// Register a template document for a base.
    Add {
        #[arg(long)]
        base: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        path: PathBuf,
        /// Suffix for output file names produced from this template.
        #[arg(long)]
        suffix: Option<String>,
    },
    /// List templates, optionally for one base.
    Ls {
        #[arg(long)]
        base: Option<String>,
    },
    /// Delete a template record (keeps the backing file).
    Rm {
        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Replace(args) => cmd_replace(args),
        Command::Auto(args) => cmd_auto(&cli.library, args),
        Command::Base(cmd) => cmd_base(&cli.library, cmd),
        Command::Template(cmd) => cmd_template(&cli.library, cmd),
    }
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.path)
        .with_context(|| format!("read document '{}'", args.path.display()))?;
    let doc = parse(&bytes)?;

    println!("canvas: {}x{}", doc.canvas_width, doc.canvas_height);
    println!("layers:");
    for layer in &doc.layers {
        print_layer(layer, 1);
    }
    println!("resources:");
    for (idx, res) in doc.resources.iter().enumerate() {
        println!("  [{idx}] {} ({} bytes)", res.name, res.payload.len());
    }
    Ok(())
}

fn print_layer(layer: &layerswap::Layer, depth: usize) {
    let indent = "  ".repeat(depth);
    match &layer.content {
        LayerContent::Raster(data) => {
            println!("{indent}raster '{}' ({} bytes)", layer.name, data.len());
        }
        LayerContent::Group(children) => {
            println!("{indent}group '{}'", layer.name);
            for child in children {
                print_layer(child, depth + 1);
            }
        }
        LayerContent::Placeholder(index) => {
            println!("{indent}placeholder '{}' -> resource {index}", layer.name);
        }
    }
}

fn cmd_replace(args: ReplaceArgs) -> anyhow::Result<()> {
    let template = std::fs::read(&args.template)
        .with_context(|| format!("read template '{}'", args.template.display()))?;
    let image = std::fs::read(&args.image)
        .with_context(|| format!("read image '{}'", args.image.display()))?;

    let out = pipeline::replace_in_document(&template, &args.layer, image)?;
    std::fs::write(&args.out, out)
        .with_context(|| format!("write output '{}'", args.out.display()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_auto(library_path: &Path, args: AutoArgs) -> anyhow::Result<()> {
    let library = Library::open(library_path)?;
    let image = std::fs::read(&args.image)
        .with_context(|| format!("read image '{}'", args.image.display()))?;
    let candidate = CandidateAsset::from_bytes(image)?;

    let templates: Vec<&TemplateRecord> = library
        .bases()
        .iter()
        .flat_map(|b| library.templates_for(&b.id))
        .collect();
    let Some((base, template)) =
        pipeline::select_template(library.bases(), &templates, &candidate, args.tolerance)
    else {
        println!(
            "no base within tolerance {} of ratio {:.4}; add a base or adjust --tolerance",
            args.tolerance,
            candidate.ratio()
        );
        return Ok(());
    };
    println!("matched base '{}' via template '{}'", base.name, template.name);

    let template_bytes = library.template_bytes(&template.id)?;
    let out = pipeline::replace_in_document(&template_bytes, &args.layer, candidate.bytes)?;

    let stem = args
        .image
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let out_path = args.out_dir.join(output_file_name(base, template, stem));
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out dir '{}'", args.out_dir.display()))?;
    std::fs::write(&out_path, out)
        .with_context(|| format!("write output '{}'", out_path.display()))?;
    println!("wrote {}", out_path.display());
    Ok(())
}

fn cmd_base(library_path: &Path, cmd: BaseCommand) -> anyhow::Result<()> {
    let mut library = Library::open(library_path)?;
    match cmd {
        BaseCommand::Add {
            name,
            width,
            height,
            prefix,
        } => {
            let base = BaseRecord {
                id: new_record_id(),
                name,
                width,
                height,
                file_prefix: prefix,
            };
            let id = base.id.clone();
            library.add_base(base)?;
            println!("added base {id}");
        }
        BaseCommand::Ls => {
            for base in library.bases() {
                println!(
                    "{}  {}  {}x{} (ratio {:.4})",
                    base.id,
                    base.name,
                    base.width,
                    base.height,
                    base.aspect_ratio()
                );
            }
        }
        BaseCommand::Rm { id } => {
            library.delete_base(&id)?;
            println!("deleted base {id}");
        }
    }
    Ok(())
}

fn cmd_template(library_path: &Path, cmd: TemplateCommand) -> anyhow::Result<()> {
    let mut library = Library::open(library_path)?;
    match cmd {
        TemplateCommand::Add {
            base,
            name,
            path,
            suffix,
        } => {
            let template = TemplateRecord {
                id: new_record_id(),
                base_id: base,
                name,
                template_path: path,
                file_suffix: suffix,
                enabled: true,
            };
            let id = template.id.clone();
            library.add_template(template)?;
            println!("added template {id}");
        }
        TemplateCommand::Ls { base } => {
            let templates: Vec<&TemplateRecord> = match &base {
                Some(base_id) => library.templates_for(base_id),
                None => library
                    .bases()
                    .iter()
                    .flat_map(|b| library.templates_for(&b.id))
                    .collect(),
            };
            for t in templates {
                let state = if t.enabled { "enabled" } else { "disabled" };
                println!(
                    "{}  {}  base={}  {}  [{state}]",
                    t.id,
                    t.name,
                    t.base_id,
                    t.template_path.display()
                );
            }
        }
        TemplateCommand::Rm { id } => {
            library.delete_template(&id)?;
            println!("deleted template {id}");
        }
    }
    Ok(())
}
