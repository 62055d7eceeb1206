//! World book conversion commands.
//!
//! Input is read from a file or stdin, converted on a blocking thread and
//! written to a file or stdout. Progress goes to the log so stdout carries
//! only the JSON.

use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use worldbook::TavoDocument;

use crate::ctx::AppContext;

/// Where conversion input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// `None` and `-` mean stdin.
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            None => Input::Stdin,
            Some(p) if p.as_os_str() == "-" => Input::Stdin,
            Some(p) => Input::File(p.to_path_buf()),
        }
    }
}

impl AppContext {
    /// Converts pseudo-XML from `input` to Tavo JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, contains no entries,
    /// or the output cannot be written.
    pub async fn convert(
        &self,
        input: Input,
        output: Option<&Path>,
        compact: bool,
    ) -> anyhow::Result<()> {
        let content = match &input {
            Input::Stdin => {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("failed to read stdin")?;
                buf
            }
            Input::File(path) => {
                let path = self.paths.resolve(path);
                tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?
            }
        };

        info!("正在转换...");
        let doc = tokio::task::spawn_blocking(move || worldbook::convert(&content))
            .await?
            .context("转换失败")?;
        let json = render(&doc, compact)?;

        match output {
            Some(path) => {
                let path = self.paths.resolve(path);
                tokio::fs::write(&path, json.as_bytes())
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("{} {}", "✓".green(), path.display());
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        let stats = &doc.tavo_format.statistics;
        info!("转换完成！共转换 {} 个条目", stats.total_entries);
        for (kind, count) in stats.entry_types.iter() {
            debug!("  {kind}: {count}");
        }
        Ok(())
    }
}

fn render(doc: &TavoDocument, compact: bool) -> anyhow::Result<String> {
    let json = if compact {
        doc.to_json()?
    } else {
        doc.to_json_pretty()?
    };
    Ok(json)
}

/// The sample entry shown by `changtian example`.
pub fn example() -> &'static str {
    worldbook::EXAMPLE
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{config::ToolConfig, ctx::PathConfig};

    fn ctx_for(project: &Path) -> AppContext {
        AppContext {
            paths: PathConfig {
                project: project.to_path_buf(),
                config_file: None,
            },
            config: ToolConfig::default(),
            android_home: project.join("sdk"),
        }
    }

    #[test]
    fn test_input_from_arg() {
        assert_eq!(Input::from_arg(None), Input::Stdin);
        assert_eq!(Input::from_arg(Some(Path::new("-"))), Input::Stdin);
        assert_eq!(
            Input::from_arg(Some(Path::new("book.txt"))),
            Input::File(PathBuf::from("book.txt"))
        );
    }

    #[tokio::test]
    async fn test_convert_file_to_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("book.txt"), example()).unwrap();
        let ctx = ctx_for(tmp.path());

        ctx.convert(
            Input::File(PathBuf::from("book.txt")),
            Some(Path::new("out.json")),
            true,
        )
        .await
        .unwrap();

        let json = fs::read_to_string(tmp.path().join("out.json")).unwrap();
        assert!(!json.contains('\n'));
        let doc = TavoDocument::from_json(&json).unwrap();
        assert_eq!(doc.tavo_format.statistics.total_entries, 1);
        assert_eq!(doc.tavo_format.entries[0].metadata.name, "认知权限总纲");
    }

    #[tokio::test]
    async fn test_convert_rejects_empty_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("empty.txt"), "  \n").unwrap();
        let ctx = ctx_for(tmp.path());

        let err = ctx
            .convert(Input::File(PathBuf::from("empty.txt")), None, false)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("请输入XML内容"), "{err:#}");
    }

    #[test]
    fn test_render_pretty() {
        let doc = worldbook::convert(example()).unwrap();
        let json = render(&doc, false).unwrap();
        assert!(json.starts_with("{\n  \"tavo_format\""));
    }
}
