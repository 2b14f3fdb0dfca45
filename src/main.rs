//! Resume analyzer: word, keyword, entity and skill report for resume PDFs

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_analyzer::cli::{self, Cli, Commands, ConfigAction, ModelAction};
use resume_analyzer::config::Config;
use resume_analyzer::error::{Result, ResumeAnalyzerError};
use resume_analyzer::input::manager::InputManager;
use resume_analyzer::ner::build_recognizer;
use resume_analyzer::ner::model_manager::ModelManager;
use resume_analyzer::output::formatter::{save_report_to_file, ReportGenerator};
use resume_analyzer::output::report::ResumeReport;
use resume_analyzer::processing::analyzer::ResumeAnalyzer;
use resume_analyzer::processing::skills::SkillVocabulary;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    match run_command(cli.command, config, config_path).await {
        Ok(()) => {}
        Err(ResumeAnalyzerError::EmptyDocument) => {
            eprintln!("{}", ResumeAnalyzerError::EmptyDocument.to_string().red().bold());
            process::exit(1);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            process::exit(1);
        }
    }
}

async fn run_command(command: Commands, config: Config, config_path: PathBuf) -> Result<()> {
    match command {
        Commands::Analyze {
            resume,
            output,
            save,
            entities,
            model,
            top,
            no_color,
        } => {
            if resume.extension().is_some() {
                cli::validate_file_extension(&resume, &["pdf"])
                    .map_err(|e| ResumeAnalyzerError::InvalidInput(format!("Resume file: {}", e)))?;
            }

            let output_format = match output {
                Some(format) => cli::parse_output_format(&format).map_err(ResumeAnalyzerError::InvalidInput)?,
                None => config.output.format,
            };
            let backend = match entities {
                Some(backend) => cli::parse_entity_backend(&backend).map_err(ResumeAnalyzerError::InvalidInput)?,
                None => config.entities.backend,
            };
            let top_keywords = top.unwrap_or(config.analysis.top_keywords);

            let recognizer = build_recognizer(&config, backend, model.as_deref()).await?;
            let analyzer = ResumeAnalyzer::new(recognizer, SkillVocabulary::new(&config.analysis.skills))
                .with_top_keywords(top_keywords);

            let report = analyze_with_spinner(&resume, &analyzer).await?;

            let use_colors = config.output.color_output && !no_color && save.is_none();
            let rendered = ReportGenerator::with_options(use_colors).generate_report(&report, &output_format)?;

            match save {
                Some(path) => {
                    save_report_to_file(&rendered, &path)?;
                    println!("✅ Report saved to {}", path.display());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Models { action } => {
            let mut model_manager = ModelManager::new(config.models_dir().clone()).await?;

            match action {
                ModelAction::List => {
                    println!("📚 Available NER Models\n");
                    for (id, info) in model_manager.list_available_models() {
                        let status = if model_manager.is_model_downloaded(id) {
                            "✅ Downloaded"
                        } else {
                            "⬇️  Available"
                        };
                        let default_marker = if *id == config.models.default_ner_model { " (default)" } else { "" };
                        println!("  • {}{} ({}) - {} MB [{}]", id, default_marker, info.repo_id, info.size_mb, status);
                        println!("    {}", info.description);
                    }
                }

                ModelAction::Download { model, force } => {
                    if model_manager.is_model_downloaded(&model) && !force {
                        println!("✅ Model '{}' is already downloaded!", model);
                        println!("💡 Use --force to re-download");
                        return Ok(());
                    }

                    println!("⬇️  Downloading model: {}", model);
                    let model_path = model_manager.download_model(&model).await?;
                    println!("✅ Model '{}' downloaded successfully!", model);
                    println!("📁 Location: {}", model_path.display());
                }

                ModelAction::Remove { model } => {
                    let removed = model_manager.remove_model(&model).await?;
                    println!("✅ Model '{}' removed ({})", model, removed.display());
                }

                ModelAction::Info { model } => {
                    let info = model_manager
                        .get_model_info(&model)
                        .ok_or_else(|| ResumeAnalyzerError::ModelNotFound(model.clone()))?;

                    println!("📋 Model Information for '{}'\n", model);
                    println!("Name: {}", info.name);
                    println!("Repository: {}", info.repo_id);
                    println!("Size: {} MB", info.size_mb);
                    println!("Labels: {}", info.labels.join(", "));
                    println!("Description: {}", info.description);

                    match model_manager.get_model_path(&model) {
                        Some(path) => println!("Status: ✅ Downloaded ({})", path.display()),
                        None => {
                            println!("Status: ⬇️  Available for download");
                            println!("\n💡 To download this model, run:");
                            println!("   resume-analyzer models download {}", model);
                        }
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("⚙️  Current Configuration\n");
                println!("Models Directory: {}", config.models_dir().display());
                println!("Default NER Model: {}", config.models.default_ner_model);
                println!("Entity Recognizer: {:?}", config.entities.backend);
                println!("Gazetteer Entries: {}", config.entities.gazetteer.len());
                println!("Top Keywords: {}", config.analysis.top_keywords);
                println!("Skills: {}", config.analysis.skills.join(", "));
                println!("Output Format: {:?}", config.output.format);
            }

            Some(ConfigAction::Reset) => {
                Config::default().save_to(&config_path)?;
                println!("✅ Configuration reset to defaults ({})", config_path.display());
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }
        },
    }

    Ok(())
}

async fn analyze_with_spinner(resume: &Path, analyzer: &ResumeAnalyzer) -> Result<ResumeReport> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Analyzing resume...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let started = Instant::now();
    let result = async {
        let text = InputManager::new().extract_text(resume).await?;
        analyzer.analyze(&text)
    }
    .await;
    spinner.finish_and_clear();

    let analysis = result?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!("Analysis finished in {}ms", elapsed_ms);

    Ok(ResumeReport::new(analysis, resume, analyzer.recognizer_name(), elapsed_ms))
}
