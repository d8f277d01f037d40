//! # Command Sync
//!
//! Turns registered command descriptors into serenity builders and pushes
//! them to Discord: per development guild, or globally in production.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Built from the handler registry instead of hand-written builders
//! - 1.0.0: Global and guild registration

use anyhow::Result;
use log::{info, warn};
use serenity::builder::{CreateApplicationCommand, CreateApplicationCommandOption};
use serenity::http::Http;
use serenity::model::application::command::{Command, CommandOptionType, CommandType};

use super::descriptor::{CommandDescriptor, CommandKind, OptionKind, OptionSpec};
use super::registry::HandlerRegistry;
use crate::core::config::{Config, RunMode};
use crate::session::ChoiceValue;

/// Builders for every registered command, sorted by name
pub fn build_application_commands(registry: &HandlerRegistry) -> Vec<CreateApplicationCommand> {
    let mut descriptors: Vec<&CommandDescriptor> = registry.commands().collect();
    descriptors.sort_by(|a, b| a.name.cmp(&b.name));
    descriptors.into_iter().map(build_command).collect()
}

fn build_command(descriptor: &CommandDescriptor) -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command.name(&descriptor.name);

    match descriptor.kind {
        CommandKind::ChatInput => {
            command.kind(CommandType::ChatInput).description(&descriptor.description);
        }
        CommandKind::User => {
            command.kind(CommandType::User);
        }
        CommandKind::Message => {
            command.kind(CommandType::Message);
        }
    }

    match descriptor.subcommands() {
        Some(subcommands) => {
            for sub in subcommands {
                let mut option = CreateApplicationCommandOption::default();
                option
                    .name(&sub.name)
                    .description(&sub.description)
                    .kind(CommandOptionType::SubCommand);
                for spec in &sub.options {
                    option.add_sub_option(build_option(spec, sub.autocomplete.is_some()));
                }
                command.add_option(option);
            }
        }
        None => {
            for spec in &descriptor.options {
                command.add_option(build_option(spec, descriptor.autocomplete.is_some()));
            }
        }
    }

    command
}

fn build_option(spec: &OptionSpec, has_autocomplete: bool) -> CreateApplicationCommandOption {
    let mut option = CreateApplicationCommandOption::default();
    option
        .name(&spec.name)
        .description(&spec.description)
        .kind(option_type(spec.kind))
        .required(spec.required);

    if spec.autocomplete {
        if has_autocomplete {
            option.set_autocomplete(true);
        } else {
            warn!("Option '{}' wants autocomplete but no handler is registered", spec.name);
        }
    }

    for (name, value) in &spec.choices {
        match value {
            ChoiceValue::String(value) => {
                option.add_string_choice(name, value);
            }
            ChoiceValue::Integer(value) => match i32::try_from(*value) {
                Ok(value) => {
                    option.add_int_choice(name, value);
                }
                Err(_) => warn!("Choice '{name}' on '{}' is out of range, skipped", spec.name),
            },
            ChoiceValue::Number(value) => {
                option.add_number_choice(name, *value);
            }
        }
    }

    option
}

fn option_type(kind: OptionKind) -> CommandOptionType {
    match kind {
        OptionKind::String => CommandOptionType::String,
        OptionKind::Integer => CommandOptionType::Integer,
        OptionKind::Number => CommandOptionType::Number,
        OptionKind::Boolean => CommandOptionType::Boolean,
        OptionKind::User => CommandOptionType::User,
        OptionKind::Channel => CommandOptionType::Channel,
        OptionKind::Role => CommandOptionType::Role,
        OptionKind::Mentionable => CommandOptionType::Mentionable,
        OptionKind::Attachment => CommandOptionType::Attachment,
    }
}

/// Replace the application's commands with the registered set
///
/// Development mode registers per guild in `DEV_GUILD_IDS` (instant);
/// production registers globally.
pub async fn register_commands(http: &Http, config: &Config, registry: &HandlerRegistry) -> Result<()> {
    match config.mode {
        RunMode::Development => {
            for guild_id in &config.dev_guild_ids {
                let commands = build_application_commands(registry);
                let count = commands.len();
                guild_id
                    .set_application_commands(http, |builder| {
                        for command in commands {
                            builder.add_application_command(command);
                        }
                        builder
                    })
                    .await?;
                info!("Guild commands registered for guild {guild_id} ({count} commands)");
            }
        }
        RunMode::Production => {
            let commands = build_application_commands(registry);
            let count = commands.len();
            Command::set_global_application_commands(http, |builder| {
                for command in commands {
                    builder.add_application_command(command);
                }
                builder
            })
            .await?;
            info!("Global commands registered successfully ({count} commands)");
        }
    }
    Ok(())
}
