use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use cfgparse::{create_backup, CfgParser, SUPPORTED_EXTENSIONS};

#[derive(Parser)]
#[command(name = "cfgparse")]
#[command(about = "读取INI/CFG配置文件，并按字节偏移就地修改")]
#[command(version)]
struct Cli {
    /// 输入INI/CFG文件路径
    #[arg(short, long)]
    input: PathBuf,

    /// 列出所有节
    #[arg(long)]
    list: bool,

    /// 显示指定节的所有键值
    #[arg(long, value_name = "SECTION")]
    items: Option<String>,

    /// 获取值（展开 %(key)s 引用）
    #[arg(long, num_args = 2, value_names = ["SECTION", "KEY"])]
    get: Option<Vec<String>>,

    /// 追加新节
    #[arg(long, value_name = "SECTION")]
    add_section: Option<String>,

    /// 设置键值（节不存在时自动创建）
    #[arg(long, num_args = 3, value_names = ["SECTION", "KEY", "VALUE"])]
    set: Option<Vec<String>>,

    /// 修改前创建备份文件
    #[arg(long)]
    backup: bool,

    /// 以JSON格式输出
    #[arg(long)]
    json: bool,

    /// 静默模式(仅输出错误)
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    validate_input(&cli.input)?;

    let mut config = CfgParser::new();
    config
        .read_file(&cli.input)
        .with_context(|| format!("解析配置文件失败: {:?}", cli.input))?;

    if cli.add_section.is_some() || cli.set.is_some() {
        handle_mutations(&cli, &config)?;
    }

    if cli.list {
        handle_list(&cli, &config)?;
    }

    if let Some(section) = &cli.items {
        handle_items(&cli, &config, section)?;
    }

    if let Some(args) = &cli.get {
        handle_get(&config, &args[0], &args[1])?;
    }

    Ok(())
}

/// 初始化日志，默认级别可由 RUST_LOG 覆盖
fn init_tracing(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 验证输入文件
fn validate_input(input: &PathBuf) -> anyhow::Result<()> {
    if !input.exists() {
        bail!("输入文件不存在: {:?}", input);
    }

    let extension = input.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    if !SUPPORTED_EXTENSIONS.iter().any(|&ext| Some(ext) == extension.as_deref()) {
        bail!("输入文件必须是INI或CFG文件");
    }

    Ok(())
}

/// 处理修改操作（先追加节，再设置键值）
fn handle_mutations(cli: &Cli, config: &CfgParser) -> anyhow::Result<()> {
    if cli.backup {
        let backup_path = create_backup(&cli.input)?;
        if !cli.quiet {
            println!("已创建备份文件: {:?}", backup_path);
        }
    }

    if let Some(section) = &cli.add_section {
        config
            .add_section(section)
            .with_context(|| format!("添加节 [{}] 失败", section))?;
        if !cli.quiet {
            println!("已添加节 [{}]", section);
        }
    }

    if let Some(args) = &cli.set {
        let (section, key, value) = (&args[0], &args[1], &args[2]);
        config
            .set(section, key, value)
            .with_context(|| format!("设置 [{}] {} 失败", section, key))?;
        if !cli.quiet {
            println!("已设置 [{}] {}{}{}", section, key, config.delimiter(), value);
        }
    }

    Ok(())
}

/// 列出所有节
fn handle_list(cli: &Cli, config: &CfgParser) -> anyhow::Result<()> {
    let mut sections = config.get_all_sections();
    sections.sort();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    for name in sections {
        let position = config.file_position(&name)?;
        if cli.quiet {
            println!("{}", name);
        } else {
            println!("[{}] (offset {})", name, position);
        }
    }

    Ok(())
}

/// 显示节内键值
fn handle_items(cli: &Cli, config: &CfgParser, section: &str) -> anyhow::Result<()> {
    let items = config.items(section)?;
    let mut keys: Vec<&String> = items.keys().collect();
    keys.sort();

    if cli.json {
        let ordered: std::collections::BTreeMap<_, _> = items.iter().collect();
        println!("{}", serde_json::to_string_pretty(&ordered)?);
        return Ok(());
    }

    for key in keys {
        println!("{}{}{}", key, config.delimiter(), items[key]);
    }

    Ok(())
}

/// 获取单个值
fn handle_get(config: &CfgParser, section: &str, key: &str) -> anyhow::Result<()> {
    let value = config.get(section, key)?;
    println!("{}", value);
    Ok(())
}
