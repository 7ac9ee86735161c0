//! Minimal CLI: schema document + JSON inputs → normalized JSON
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::{Model, Options, SchemaDoc, TypeRegistry};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// load JSON documents into declared record types and print what a dump gives back
#[derive(Parser, Debug)]
#[command(name = "ldmodel", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// load each input as a record and print its dump
    Load(LoadOut),
    /// print every resolved record type with its fields
    Describe(DescribeOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// JSON schema document declaring the record types
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(clap::Parser, Debug)]
struct LoadOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// record type each input is loaded as
    #[arg(long = "type", short = 't')]
    type_name: String,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// converter option forwarded verbatim (`key=value`, value parsed as JSON when possible)
    #[arg(long = "option", short = 'O', value_parser = parse_option)]
    options: Vec<(String, Value)>,

    /// indent output with four spaces
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// output file (stdout if omitted); multiple inputs are written one per line
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn registry(&self) -> Result<TypeRegistry> {
        let doc = SchemaDoc::from_file(&self.schema)?;
        doc.build()
            .with_context(|| format!("invalid schema document {}", self.schema.display()))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Load(target) => {
                let model = Model::new(target.schema_settings.registry()?);
                let options: Options = target.options.iter().cloned().collect();

                let mut rendered = Vec::new();
                for source_path in resolve_file_path_patterns(&target.input)? {
                    let record = model
                        .load_from_file(&target.type_name, &source_path, &options)
                        .with_context(|| format!("failed to load {}", source_path.display()))?;
                    tracing::debug!(path = %source_path.display(), "loaded");
                    rendered.push(model.dump_to_string(&record, &options, target.pretty)?);
                }
                let output = rendered.join("\n");

                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, output + "\n")?;
                } else {
                    println!("{output}");
                }
            }
            Command::Describe(target) => {
                let registry = target.schema_settings.registry()?;
                for record in registry.iter() {
                    println!("{}", record.name);
                    for field in &record.fields {
                        match &field.default {
                            Some(d) => println!("    {}: {} = {d}", field.name, field.ty),
                            None => println!("    {}: {}", field.name, field.ty),
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn parse_option(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected `key=value`, got `{raw}`"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
