//! 交互式输入辅助
//!
//! 每种提示都是一个小状态机：读取一行 -> 解析 -> 成功返回或给出
//! [`RetryReason`] 后重新提示。空输入一律接受默认值。
//! 输入流结束（例如 stdin 被关闭）时返回错误，而不是无限重试。

use crate::config::expand_home;
use crate::{Result, TethysError};
#[cfg(any(test, feature = "test-util"))]
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// 重新提示的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// 不是整数
    NotANumber(String),
    /// 超出允许范围
    OutOfRange { value: i64, min: i64, max: i64 },
    /// 不在可选项内
    InvalidChoice { value: String, choices: Vec<String> },
    /// 两次输入的密码不一致
    PasswordMismatch,
    /// 目录无法创建
    Directory { path: PathBuf, reason: String },
}

impl std::fmt::Display for RetryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryReason::NotANumber(value) => write!(f, "\"{value}\" 不是有效的整数"),
            RetryReason::OutOfRange { value, min, max } => {
                write!(f, "{value} 超出范围，请输入 {min} 到 {max} 之间的数字")
            }
            RetryReason::InvalidChoice { value, choices } => {
                write!(f, "\"{value}\" 不是有效选项，可选: {}", choices.join(", "))
            }
            RetryReason::PasswordMismatch => write!(f, "两次输入的密码不一致，请重新输入"),
            RetryReason::Directory { path, reason } => {
                write!(f, "无法创建目录 {}: {}", path.display(), reason)
            }
        }
    }
}

/// 终端输入源
pub trait InputSource {
    /// 显示提示并读取一行（不含换行符）
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// 显示提示并读取一行，不回显输入内容
    fn read_password(&mut self, prompt: &str) -> io::Result<String>;
}

/// 标准输入
#[derive(Debug, Default)]
pub struct TerminalInput;

impl TerminalInput {
    fn read_stdin_line() -> io::Result<String> {
        let mut input = String::new();
        let bytes = io::stdin().lock().read_line(&mut input)?;
        if bytes == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "输入已结束"));
        }
        Ok(input.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl InputSource for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        Self::read_stdin_line()
    }

    #[cfg(unix)]
    fn read_password(&mut self, prompt: &str) -> io::Result<String> {
        use nix::sys::termios::{LocalFlags, SetArg, tcgetattr, tcsetattr};

        print!("{prompt}");
        io::stdout().flush()?;

        let stdin = io::stdin();
        // 非终端（管道输入）时无法关闭回显，直接读取
        let Ok(original) = tcgetattr(&stdin) else {
            return Self::read_stdin_line();
        };

        let mut silent = original.clone();
        silent.local_flags.remove(LocalFlags::ECHO);
        silent.local_flags.insert(LocalFlags::ECHONL);
        tcsetattr(&stdin, SetArg::TCSANOW, &silent).map_err(io::Error::from)?;

        let result = Self::read_stdin_line();
        tcsetattr(&stdin, SetArg::TCSANOW, &original).map_err(io::Error::from)?;
        result
    }

    #[cfg(not(unix))]
    fn read_password(&mut self, prompt: &str) -> io::Result<String> {
        self.read_line(prompt)
    }
}

/// 预先给定输入序列的输入源，记录所有提示（仅测试及 `test-util` 特性可用）
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    pub prompts: Vec<String>,
}

#[cfg(any(test, feature = "test-util"))]
impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// 尚未被读取的输入
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl InputSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.lines
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "输入已结束"))
    }

    fn read_password(&mut self, prompt: &str) -> io::Result<String> {
        self.read_line(prompt)
    }
}

/// 解析整数输入
pub fn parse_numeric(input: &str, min: i64, max: i64, default: i64) -> std::result::Result<i64, RetryReason> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(default);
    }

    let value = input
        .parse::<i64>()
        .map_err(|_| RetryReason::NotANumber(input.to_string()))?;

    if value < min || value > max {
        return Err(RetryReason::OutOfRange { value, min, max });
    }
    Ok(value)
}

/// 解析选项输入（忽略大小写），返回规范写法
pub fn parse_choice(input: &str, choices: &[&str], default: &str) -> std::result::Result<String, RetryReason> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(default.to_string());
    }

    choices
        .iter()
        .find(|choice| choice.eq_ignore_ascii_case(input))
        .map(|choice| choice.to_string())
        .ok_or_else(|| RetryReason::InvalidChoice {
            value: input.to_string(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
        })
}

/// 将目录输入解析为绝对路径并确保存在
pub fn resolve_directory(input: &str, default: &Path) -> std::result::Result<PathBuf, RetryReason> {
    let input = input.trim();
    let path = if input.is_empty() {
        default.to_path_buf()
    } else {
        expand_home(input)
    };

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(|e| RetryReason::Directory {
                path: path.clone(),
                reason: e.to_string(),
            })?
            .join(path)
    };

    if !path.is_dir() {
        std::fs::create_dir_all(&path).map_err(|e| RetryReason::Directory {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(path)
}

/// 带校验与重试的交互式输入
pub struct UserInputHelper<'a> {
    source: &'a mut dyn InputSource,
}

impl<'a> UserInputHelper<'a> {
    pub fn new(source: &'a mut dyn InputSource) -> Self {
        Self { source }
    }

    /// 读取输入，空字符串时返回默认值
    pub fn get_input_with_default(&mut self, prompt: &str, default: &str) -> Result<String> {
        let value = self.source.read_line(&format!("{prompt} [{default}]: "))?;
        let value = value.trim();
        if value.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(value.to_string())
        }
    }

    /// 读取密码并要求二次确认；首次输入为空时接受默认值
    pub fn get_verified_password(&mut self, prompt: &str, default: &str) -> Result<String> {
        loop {
            let password = self
                .source
                .read_password(&format!("{prompt} [{}]: ", "*".repeat(default.len())))?;
            if password.is_empty() {
                return Ok(default.to_string());
            }

            let confirm = self.source.read_password("确认密码: ")?;
            if password == confirm {
                return Ok(password);
            }
            warn!("⚠️  {}", RetryReason::PasswordMismatch);
        }
    }

    /// 读取 `[min, max]` 范围内的整数
    pub fn get_valid_numeric_input(
        &mut self,
        prompt: &str,
        min_val: i64,
        max_val: i64,
        default: i64,
    ) -> Result<i64> {
        let prompt = format!("{prompt} (范围 {min_val}-{max_val}) [{default}]: ");
        loop {
            let input = self.source.read_line(&prompt)?;
            match parse_numeric(&input, min_val, max_val, default) {
                Ok(value) => return Ok(value),
                Err(reason) => warn!("⚠️  {}", reason),
            }
        }
    }

    /// 从固定选项中选择（忽略大小写）
    pub fn get_valid_choice_input(
        &mut self,
        prompt: &str,
        choices: &[&str],
        default: &str,
    ) -> Result<String> {
        if choices.is_empty() {
            return Err(TethysError::custom("选项列表不能为空"));
        }

        let prompt = format!("{prompt} [{}] [{default}]: ", choices.join("/"));
        loop {
            let input = self.source.read_line(&prompt)?;
            match parse_choice(&input, choices, default) {
                Ok(value) => return Ok(value),
                Err(reason) => warn!("⚠️  {}", reason),
            }
        }
    }

    /// 读取目录路径，不存在时自动创建；创建失败则重新提示
    pub fn get_valid_directory_input(&mut self, prompt: &str, default: &Path) -> Result<PathBuf> {
        let prompt = format!("{prompt} [{}]: ", default.display());
        loop {
            let input = self.source.read_line(&prompt)?;
            match resolve_directory(&input, default) {
                Ok(path) => return Ok(path),
                Err(reason) => warn!("⚠️  {}", reason),
            }
        }
    }

    /// `y/n` 问题
    pub fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let default = if default { "y" } else { "n" };
        let answer = self.get_valid_choice_input(prompt, &["y", "n"], default)?;
        Ok(answer == "y")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_numeric_input_retries_until_valid() {
        let mut input = ScriptedInput::new(["five", "11", "10.0", "10"]);
        let value = UserInputHelper::new(&mut input)
            .get_valid_numeric_input("x", 1, 10, 5)
            .unwrap();

        assert_eq!(value, 10);
        assert_eq!(input.prompts.len(), 4);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_parse_numeric_reasons() {
        assert_eq!(
            parse_numeric("five", 1, 10, 5),
            Err(RetryReason::NotANumber("five".to_string()))
        );
        assert_eq!(
            parse_numeric("11", 1, 10, 5),
            Err(RetryReason::OutOfRange { value: 11, min: 1, max: 10 })
        );
        assert_eq!(
            parse_numeric("10.0", 1, 10, 5),
            Err(RetryReason::NotANumber("10.0".to_string()))
        );
        assert_eq!(parse_numeric("", 1, 10, 5), Ok(5));
        assert_eq!(parse_numeric(" 7 ", 1, 10, 5), Ok(7));
    }

    #[test]
    fn test_input_with_default() {
        let mut input = ScriptedInput::new(["", "  custom  "]);
        let mut helper = UserInputHelper::new(&mut input);
        assert_eq!(helper.get_input_with_default("Name", "NONE").unwrap(), "NONE");
        assert_eq!(helper.get_input_with_default("Name", "NONE").unwrap(), "custom");
    }

    #[test]
    fn test_verified_password_default_on_empty() {
        let mut input = ScriptedInput::new([""]);
        let password = UserInputHelper::new(&mut input)
            .get_verified_password("Password", "pass")
            .unwrap();

        assert_eq!(password, "pass");
        assert_eq!(input.prompts.len(), 1);
    }

    #[test]
    fn test_verified_password_loops_on_mismatch() {
        let mut input = ScriptedInput::new(["secret", "secert", "secret", "secret"]);
        let password = UserInputHelper::new(&mut input)
            .get_verified_password("Password", "pass")
            .unwrap();

        assert_eq!(password, "secret");
        assert_eq!(input.prompts.len(), 4);
    }

    #[test]
    fn test_verified_password_mismatch_then_default() {
        let mut input = ScriptedInput::new(["a", "b", ""]);
        let password = UserInputHelper::new(&mut input)
            .get_verified_password("Password", "pass")
            .unwrap();
        assert_eq!(password, "pass");
    }

    #[test]
    fn test_choice_input_is_case_insensitive() {
        let mut input = ScriptedInput::new(["maybe", "Y"]);
        let answer = UserInputHelper::new(&mut input)
            .get_valid_choice_input("Bind", &["y", "n"], "n")
            .unwrap();

        assert_eq!(answer, "y");
        assert_eq!(input.prompts.len(), 2);
    }

    #[test]
    fn test_choice_input_default() {
        let mut input = ScriptedInput::new([""]);
        let mut helper = UserInputHelper::new(&mut input);
        assert!(!helper.confirm("Bind", false).unwrap());
    }

    #[test]
    fn test_directory_input_creates_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("geoserver").join("data");
        let mut input = ScriptedInput::new([target.to_string_lossy().to_string()]);

        let path = UserInputHelper::new(&mut input)
            .get_valid_directory_input("Data dir", dir.path())
            .unwrap();

        assert_eq!(path, target);
        assert!(target.is_dir());
    }

    #[test]
    fn test_directory_input_retries_on_error() {
        let dir = tempdir().unwrap();
        // 以普通文件为父目录，创建必然失败
        let file = dir.path().join("occupied");
        std::fs::write(&file, "x").unwrap();
        let bad = file.join("child");

        let mut input = ScriptedInput::new([bad.to_string_lossy().to_string(), String::new()]);
        let path = UserInputHelper::new(&mut input)
            .get_valid_directory_input("Data dir", dir.path())
            .unwrap();

        assert_eq!(path, dir.path());
        assert_eq!(input.prompts.len(), 2);
    }

    #[test]
    fn test_end_of_input_is_an_error() {
        let mut input = ScriptedInput::new(["bogus"]);
        let result = UserInputHelper::new(&mut input).get_valid_numeric_input("x", 1, 10, 5);
        assert!(matches!(result, Err(TethysError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_scripted_input_records_prompts() {
        let mut input = ScriptedInput::new(["first"]);
        assert_eq!(input.remaining(), 1);

        assert_eq!(input.read_password("Password").unwrap(), "first");
        let eof = input.read_line("Again").unwrap_err();

        assert_eq!(eof.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(input.prompts, vec!["Password".to_string(), "Again".to_string()]);
        assert_eq!(input.remaining(), 0);
    }
}
