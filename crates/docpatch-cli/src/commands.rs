use std::fs;
use std::path::Path as FsPath;

use anyhow::Context;
use colored::Colorize;
use docpatch_diff::{diff_patch, validate_document, DiffOptions};
use docpatch_types::{Mutation, Operation, Path};
use serde_json::Value;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &cli.format),
        Command::Validate(args) => cmd_validate(args, &cli.format),
    }
}

fn cmd_diff(args: DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mutations = compute_mutations(&args)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&mutations)?),
        OutputFormat::Text if mutations.is_empty() => println!("No changes."),
        OutputFormat::Text => {
            for mutation in &mutations {
                println!("{}", describe(mutation));
            }
        }
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let document = load_json(&args.file)?;
    validate_document(&document)
        .with_context(|| format!("{} is not a valid document", args.file.display()))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "valid": true })),
        OutputFormat::Text => println!("{} {} is valid", "✓".green().bold(), args.file.display()),
    }
    Ok(())
}

fn compute_mutations(args: &DiffArgs) -> anyhow::Result<Vec<Mutation>> {
    let options = load_options(args)?;
    let a = load_json(&args.a)?;
    let b = load_json(&args.b)?;
    debug!(a = %args.a.display(), b = %args.b.display(), ?options, "diffing documents");
    let mutations = diff_patch(&a, &b, &options)
        .with_context(|| format!("cannot diff {} against {}", args.a.display(), args.b.display()))?;
    Ok(mutations)
}

/// Option file first, then flag overrides.
fn load_options(args: &DiffArgs) -> anyhow::Result<DiffOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("invalid options in {}", path.display()))?
        }
        None => DiffOptions::default(),
    };

    if let Some(id) = &args.id {
        options = options.with_id(id.clone());
    }
    if let Some(revision) = &args.if_revision {
        options = options.with_revision(revision.clone());
    }
    if args.infer_revision {
        options = options.infer_revision();
    }
    if let Some(base_path) = &args.base_path {
        let value: Value =
            serde_json::from_str(base_path).context("--base-path must be a JSON array")?;
        options = options.with_base_path(Path::from_value(&value)?);
    }
    if args.no_text_patch {
        options = options.without_text_patch();
    }
    if args.quiet {
        options = options.quiet();
    }
    Ok(options)
}

fn load_json(path: &FsPath) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// One line per mutation: operation, id, touched paths, guard.
fn describe(mutation: &Mutation) -> String {
    let operation = mutation.operation();
    let kind = match operation {
        Operation::Set(_) => operation.kind().green(),
        Operation::Unset(_) => operation.kind().red(),
        Operation::DiffMatchPatch(_) => operation.kind().cyan(),
        Operation::Insert(_) => operation.kind().yellow(),
    };
    let mut line = format!(
        "{} {} {}",
        kind.bold(),
        mutation.id().dimmed(),
        operation.paths().join(", ")
    );
    if let Some(revision) = mutation.if_revision_id() {
        line.push_str(&format!(" (if revision {})", revision.yellow()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpatch_diff::RevisionGuard;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn diff_args(a: &NamedTempFile, b: &NamedTempFile) -> DiffArgs {
        DiffArgs {
            a: a.path().to_path_buf(),
            b: b.path().to_path_buf(),
            id: None,
            if_revision: None,
            infer_revision: false,
            base_path: None,
            no_text_patch: false,
            config: None,
            quiet: false,
        }
    }

    #[test]
    fn computes_mutations_from_files() {
        let a = write_file(r#"{"_id": "x", "title": "A", "tags": ["a"]}"#);
        let b = write_file(r#"{"_id": "x", "title": "B", "tags": ["a", "b"]}"#);
        let mutations = compute_mutations(&diff_args(&a, &b)).unwrap();
        assert_eq!(
            serde_json::to_value(&mutations).unwrap(),
            serde_json::json!([
                {"patch": {"id": "x", "set": {"title": "B"}}},
                {"patch": {"id": "x", "insert": {"after": "tags[0]", "items": ["b"]}}}
            ])
        );
    }

    #[test]
    fn options_file_then_flags() {
        let config = write_file(concat!(
            "id = \"from-file\"\n",
            "ifRevisionID = true\n",
            "basePath = [\"author\"]\n",
            "\n",
            "[diffMatchPatch]\n",
            "lengthThresholdAbsolute = 50\n",
        ));
        let a = write_file("{}");
        let mut args = diff_args(&a, &a);
        args.config = Some(config.path().to_path_buf());

        let options = load_options(&args).unwrap();
        assert_eq!(options.id.as_deref(), Some("from-file"));
        assert_eq!(options.if_revision_id, RevisionGuard::Infer);
        assert_eq!(options.base_path.encode(), "author");
        assert_eq!(options.diff_match_patch.length_threshold_absolute, 50);

        args.id = Some("from-flag".into());
        args.if_revision = Some("rev-1".into());
        args.base_path = Some(r#"["meta", {"_key": "k1"}]"#.into());
        args.quiet = true;
        let options = load_options(&args).unwrap();
        assert_eq!(options.id.as_deref(), Some("from-flag"));
        assert_eq!(options.if_revision_id, RevisionGuard::Revision("rev-1".into()));
        assert_eq!(options.base_path.encode(), r#"meta[_key=="k1"]"#);
        assert!(options.hide_warnings);
    }

    #[test]
    fn bad_base_path_is_an_error() {
        let a = write_file("{}");
        let mut args = diff_args(&a, &a);
        args.base_path = Some(r#"[true]"#.into());
        assert!(load_options(&args).is_err());

        args.base_path = Some("not json".into());
        let err = load_options(&args).unwrap_err();
        assert!(err.to_string().contains("--base-path"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_json(&PathBuf::from("/nonexistent/doc.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/doc.json"));
    }

    #[test]
    fn diff_errors_carry_context() {
        let a = write_file(r#"{"_id": "a"}"#);
        let b = write_file(r#"{"_id": "b"}"#);
        let err = compute_mutations(&diff_args(&a, &b)).unwrap_err();
        assert!(err.to_string().starts_with("cannot diff"));
        assert!(err.root_cause().to_string().contains("_id"));
    }

    #[test]
    fn validate_reports_nested_arrays() {
        let file = write_file(r#"{"grid": [[1, 2]]}"#);
        let args = ValidateArgs { file: file.path().to_path_buf() };
        let err = cmd_validate(args, &OutputFormat::Text).unwrap_err();
        assert!(err.root_cause().to_string().contains("grid[0]"));

        let file = write_file(r#"{"_id": "x", "title": "ok"}"#);
        let args = ValidateArgs { file: file.path().to_path_buf() };
        assert!(cmd_validate(args, &OutputFormat::Json).is_ok());
    }

    #[test]
    fn describes_mutations() {
        colored::control::set_override(false);
        let mutation = Mutation::new("x", Operation::Unset(vec!["a".into(), "b[1:]".into()]))
            .with_revision("rev-1");
        assert_eq!(describe(&mutation), "unset x a, b[1:] (if revision rev-1)");
    }
}
