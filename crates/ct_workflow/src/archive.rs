// crates/ct_workflow/src/archive.rs

//! 结果归档
//!
//! 输出以 gzip 压缩的 tar 包交付：
//!
//! - 单场景运行: 整个输出目录
//! - 比较运行: 顶层为图像与图例、`results.csv`，
//!   每个场景一个子目录，内含参数文件与该场景的全部 CSV 表

use std::fs::File;
use std::path::{Path, PathBuf};

use ct_foundation::ensure;
use ct_foundation::error::{CtError, CtResult};
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder;
use ct_raster::{IMAGE_FILE_NAME, LEGEND_FILE_NAME};
use tracing::{debug, info};

use crate::{INPUTS_FILE_NAME, RESULTS_FILE_NAME};

fn archive_error(dest: &Path, e: std::io::Error) -> CtError {
    CtError::io_with_source(format!("写入归档 {}", dest.display()), e)
}

/// tar.gz 写出器
pub struct ArchiveWriter {
    builder: Builder<GzEncoder<File>>,
    dest: PathBuf,
    entries: usize,
}

impl ArchiveWriter {
    /// 创建归档文件，父目录不存在时一并创建
    pub fn create(dest: &Path) -> CtResult<Self> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| archive_error(dest, e))?;
        }
        let file = File::create(dest).map_err(|e| archive_error(dest, e))?;
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
        builder.follow_symlinks(true);
        Ok(Self {
            builder,
            dest: dest.to_path_buf(),
            entries: 0,
        })
    }

    /// 以指定名称加入单个文件
    pub fn add_file(&mut self, src: &Path, name: impl AsRef<Path>) -> CtResult<()> {
        let mut file = File::open(src)
            .map_err(|e| CtError::io_with_source(format!("读取 {}", src.display()), e))?;
        self.builder
            .append_file(name, &mut file)
            .map_err(|e| archive_error(&self.dest, e))?;
        self.entries += 1;
        Ok(())
    }

    /// 加入整个目录
    pub fn add_dir_all(&mut self, name: impl AsRef<Path>, src: &Path) -> CtResult<()> {
        self.builder
            .append_dir_all(name, src)
            .map_err(|e| archive_error(&self.dest, e))?;
        self.entries += 1;
        Ok(())
    }

    /// 加入空目录项
    pub fn add_dir(&mut self, name: impl AsRef<Path>, src: &Path) -> CtResult<()> {
        self.builder
            .append_dir(name, src)
            .map_err(|e| archive_error(&self.dest, e))?;
        self.entries += 1;
        Ok(())
    }

    /// 结束 tar 流并刷新 gzip 尾部
    pub fn finish(self) -> CtResult<PathBuf> {
        let encoder = self
            .builder
            .into_inner()
            .map_err(|e| archive_error(&self.dest, e))?;
        encoder.finish().map_err(|e| archive_error(&self.dest, e))?;
        debug!("归档 {} 写出 {} 项", self.dest.display(), self.entries);
        Ok(self.dest)
    }
}

/// 归档整个目录，条目位于 `.` 之下
pub fn archive_directory(src: &Path, dest: &Path) -> CtResult<PathBuf> {
    ensure!(src.is_dir(), CtError::file_not_found(src));
    let mut writer = ArchiveWriter::create(dest)?;
    writer.add_dir_all(".", src)?;
    let path = writer.finish()?;
    info!("归档完成: {}", path.display());
    Ok(path)
}

/// 比较运行中的一个场景
#[derive(Debug, Clone)]
pub struct ScenarioOutput<'a> {
    /// 归档内子目录名（场景安全名）
    pub name: &'a str,
    /// 输出目录
    pub directory: &'a Path,
}

/// 归档比较运行
///
/// 图像与 `results.csv` 取自第一个场景的输出目录。两个场景安全名相同时第二个子目录追加 `_2`。
pub fn archive_comparison(
    first: ScenarioOutput<'_>,
    second: ScenarioOutput<'_>,
    dest: &Path,
) -> CtResult<PathBuf> {
    let mut writer = ArchiveWriter::create(dest)?;

    for name in [IMAGE_FILE_NAME, LEGEND_FILE_NAME, RESULTS_FILE_NAME] {
        let src = first.directory.join(name);
        if src.exists() {
            writer.add_file(&src, name)?;
        }
    }

    let second_name = if second.name == first.name {
        format!("{}_2", second.name)
    } else {
        second.name.to_string()
    };
    add_scenario_files(&mut writer, first.name, first.directory)?;
    add_scenario_files(&mut writer, &second_name, second.directory)?;

    let path = writer.finish()?;
    info!("比较归档完成: {}", path.display());
    Ok(path)
}

fn add_scenario_files(writer: &mut ArchiveWriter, name: &str, dir: &Path) -> CtResult<()> {
    writer.add_dir(name, dir)?;

    let inputs = dir.join(INPUTS_FILE_NAME);
    if inputs.exists() {
        writer.add_file(&inputs, Path::new(name).join(INPUTS_FILE_NAME))?;
    }

    let listing = std::fs::read_dir(dir)
        .map_err(|e| CtError::io_with_source(format!("读取目录 {}", dir.display()), e))?;
    let mut csv_files = Vec::new();
    for entry in listing {
        let path = entry?.path();
        let is_csv = path.extension().is_some_and(|ext| ext == "csv");
        let is_results = path.file_name().is_some_and(|n| n == RESULTS_FILE_NAME);
        if path.is_file() && is_csv && !is_results {
            csv_files.push(path);
        }
    }
    csv_files.sort();

    for path in csv_files {
        if let Some(file_name) = path.file_name() {
            writer.add_file(&path, Path::new(name).join(file_name))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::collections::BTreeSet;
    use std::fs;

    fn entry_names(path: &Path) -> BTreeSet<String> {
        let file = File::open(path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                let name = e.path().unwrap().to_string_lossy().into_owned();
                name.trim_start_matches("./").trim_end_matches('/').to_string()
            })
            .filter(|n| !n.is_empty() && n != ".")
            .collect()
    }

    #[test]
    fn test_archive_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("run");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("receptors.csv"), "id,x,y\n").unwrap();
        fs::write(src.join("concentrations.png"), [0u8; 4]).unwrap();

        let dest = tmp.path().join("archives").join("Downtown.tar.gz");
        let path = archive_directory(&src, &dest).unwrap();
        assert_eq!(path, dest);

        let names = entry_names(&dest);
        assert!(names.contains("receptors.csv"));
        assert!(names.contains("concentrations.png"));
    }

    #[test]
    fn test_archive_directory_missing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let err = archive_directory(&tmp.path().join("nope"), &tmp.path().join("a.tar.gz"));
        assert!(matches!(err, Err(CtError::FileNotFound { .. })));
    }

    #[test]
    fn test_archive_comparison_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let d1 = tmp.path().join("one");
        let d2 = tmp.path().join("two");
        for d in [&d1, &d2] {
            fs::create_dir(d).unwrap();
            fs::write(d.join(INPUTS_FILE_NAME), "a = 1\n").unwrap();
            fs::write(d.join("roads.csv"), "id\n").unwrap();
            fs::write(d.join("concentrations.png"), [1u8]).unwrap();
        }
        fs::write(d1.join("concentrations_legend.png"), [1u8]).unwrap();
        fs::write(d1.join(RESULTS_FILE_NAME), "x,y,v\n").unwrap();

        let dest = tmp.path().join("Base_vs_Build.tar.gz");
        archive_comparison(
            ScenarioOutput { name: "Base", directory: &d1 },
            ScenarioOutput { name: "Build", directory: &d2 },
            &dest,
        )
        .unwrap();

        let names = entry_names(&dest);
        let expected: BTreeSet<String> = [
            "concentrations.png",
            "concentrations_legend.png",
            "results.csv",
            "Base",
            "Base/CTOOLS_Inputs.txt",
            "Base/roads.csv",
            "Build",
            "Build/CTOOLS_Inputs.txt",
            "Build/roads.csv",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_archive_comparison_same_names() {
        let tmp = tempfile::tempdir().unwrap();
        let d1 = tmp.path().join("one");
        let d2 = tmp.path().join("two");
        fs::create_dir(&d1).unwrap();
        fs::create_dir(&d2).unwrap();
        fs::write(d2.join("area.csv"), "x\n").unwrap();

        let dest = tmp.path().join("S_vs_S.tar.gz");
        archive_comparison(
            ScenarioOutput { name: "S", directory: &d1 },
            ScenarioOutput { name: "S", directory: &d2 },
            &dest,
        )
        .unwrap();
        assert!(entry_names(&dest).contains("S_2/area.csv"));
    }
}
