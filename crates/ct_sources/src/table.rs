// crates/ct_sources/src/table.rs

//! 逗号分隔输入表
//!
//! 求解器以逗号 / 空白分隔读取输入，首行为列名。
//! 含分隔符、引号或换行的单元格由 `csv` 写出器按需加引号。

use std::fs;
use std::io;
use std::path::Path;

use ct_foundation::ensure;
use ct_foundation::error::{CtError, CtResult};

/// 数值单元格格式化
///
/// 整数值不带小数点（`20000`），其余使用最短往返表示。
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

/// 输入表
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl InputTable {
    /// 以列名创建空表
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// 列名
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// 数据行
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否为空表
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 追加一行，列数必须与表头一致
    pub fn push_row(&mut self, row: Vec<String>) -> CtResult<()> {
        ensure!(
            row.len() == self.header.len(),
            CtError::invalid_input(format!(
                "输入表行宽 {} 与表头宽 {} 不一致",
                row.len(),
                self.header.len()
            ))
        );
        self.rows.push(row);
        Ok(())
    }

    /// 追加一行数值
    pub fn push_numbers<I>(&mut self, values: I) -> CtResult<()>
    where
        I: IntoIterator<Item = f64>,
    {
        self.push_row(values.into_iter().map(format_number).collect())
    }

    /// 渲染为 CSV 文本（`\n` 行尾）
    pub fn to_csv_string(&self) -> CtResult<String> {
        let bytes = self
            .write_records(Vec::new())
            .map_err(|e| CtError::io_with_source("输入表渲染失败", e.into()))?;
        String::from_utf8(bytes).map_err(|e| CtError::internal(format!("输入表不是 UTF-8: {e}")))
    }

    /// 写入文件并刷新到磁盘
    pub fn write_csv(&self, path: &Path) -> CtResult<()> {
        let file = fs::File::create(path)
            .map_err(|e| CtError::io_with_source(format!("无法创建 {}", path.display()), e))?;
        let file = self
            .write_records(file)
            .map_err(|e| CtError::io_with_source(format!("无法写入 {}", path.display()), e.into()))?;
        file.sync_all()
            .map_err(|e| CtError::io_with_source(format!("无法写入 {}", path.display()), e))?;
        tracing::debug!(path = %path.display(), rows = self.rows.len(), "输入表已写入");
        Ok(())
    }

    fn write_records<W: io::Write>(&self, sink: W) -> csv::Result<W> {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(sink);
        wtr.write_record(&self.header)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        wtr.into_inner().map_err(|e| e.into_error().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_format() {
        assert_eq!(format_number(20000.0), "20000");
        assert_eq!(format_number(-999.0), "-999");
        assert_eq!(format_number(0.25), "0.25");
    }

    #[test]
    fn test_csv_rendering() {
        let mut t = InputTable::new(["id", "name"]);
        t.push_row(vec!["1".into(), "a,b".into()]).unwrap();
        t.push_row(vec!["2".into(), "say \"hi\"".into()]).unwrap();
        assert_eq!(
            t.to_csv_string().unwrap(),
            "id,name\n1,\"a,b\"\n2,\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_row_width_checked() {
        let mut t = InputTable::new(["a", "b"]);
        assert!(t.push_numbers([1.0]).is_err());
        assert!(t.push_numbers([1.0, 2.0]).is_ok());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receptors.csv");
        let mut t = InputTable::new(["id", "x", "y"]);
        t.push_numbers([1.0, 10.5, -3.0]).unwrap();
        t.write_csv(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id,x,y\n1,10.5,-3\n");
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let t = InputTable::new(["id"]);
        let err = t.write_csv(Path::new("/nonexistent/dir/x.csv")).unwrap_err();
        assert!(matches!(err, CtError::Io { .. }));
    }
}
