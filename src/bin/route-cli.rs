//! Offline inspection of route templates.

use clap::{Parser, Subcommand};
use serde_json::json;

use route_dispatch::routing::{
    extract_bindings, infer_type, matches, HttpMethod, PathResource, TemplateCompiler,
};

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Compile and test route templates", long_about = None)]
struct Cli {
    /// Compile untyped `{name}` segments as strings.
    #[arg(long)]
    absolute_typing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the compiled segments, priority and canonical form of a template
    Compile {
        template: String,
        #[arg(short, long, default_value = "ALL")]
        method: String,
    },
    /// Check a request path against a template and show the bindings
    Match { template: String, path: String },
    /// Show the type inferred for a request segment
    Infer { segment: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let compiler = TemplateCompiler::new(cli.absolute_typing);

    let output = match cli.command {
        Commands::Compile { template, method } => {
            let method: HttpMethod = method
                .parse()
                .map_err(|m| format!("unsupported method `{}`", m))?;
            let compiled = compiler.compile(method, &template)?;
            json!({
                "method": compiled.method(),
                "canonical": compiled.to_string(),
                "priority": compiled.priority(),
                "segments": compiled.segments(),
            })
        }
        Commands::Match { template, path } => {
            let compiled = compiler.compile(HttpMethod::All, &template)?;
            let resource = PathResource::parse(&path);
            let matched = matches(&resource, &compiled);
            let bindings = if matched {
                extract_bindings(&resource, &compiled)
            } else {
                Default::default()
            };
            json!({
                "template": compiled.to_string(),
                "path": path,
                "types": resource.types(),
                "matched": matched,
                "bindings": bindings,
            })
        }
        Commands::Infer { segment } => json!({
            "segment": segment,
            "type": infer_type(&segment),
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
