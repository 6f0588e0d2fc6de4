// src/main.rs

use clap::Parser;
use saaamc::diagnostic;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

/// SAAAM 游戏脚本编译器：把 .saaam 源码编译为宿主运行时可执行的脚本
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 要编译的 SAAAM 源文件
    input: PathBuf,

    /// 目标脚本的写出位置。缺省时把输入文件的扩展名换成 .js
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 只做检查（词法、语法、静态分析），不写出目标文件
    #[arg(long)]
    check: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let file_name = cli.input.display().to_string();

    let source = match fs::read_to_string(&cli.input) {
        Ok(text) => text,
        Err(io_error) => return Err(format!("cannot read '{}': {}", file_name, io_error).into()),
    };

    // 整个管线都在 compile 里；CLI 只负责文件读写和诊断渲染。
    let result = saaamc::compile(&source);

    diagnostic::render(&file_name, &source, &result.errors);
    diagnostic::render(&file_name, &source, &result.warnings);

    if !result.success {
        eprintln!("error: could not compile '{}'", file_name);
        process::exit(1);
    }
    let script = result
        .output
        .expect("a successful compilation always carries its output");

    if cli.check {
        println!("'{}' compiles cleanly", file_name);
        return Ok(());
    }

    let output_path = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension("js"));
    fs::write(&output_path, script)?;
    println!("compiled '{}' -> '{}'", file_name, output_path.display());

    Ok(())
}
