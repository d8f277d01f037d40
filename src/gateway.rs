//! # Gateway Adapter
//!
//! The only module that speaks serenity interaction types. It classifies
//! raw interactions into [`InboundInteraction`]s, answers them through
//! [`SerenitySession`], and forwards gateway events to the event bus.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Route every interaction through the dispatcher
//! - 1.0.0: Hard-wired slash command and component handling

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serenity::builder::{
    CreateComponents, CreateEmbed, CreateInteractionResponse, CreateInteractionResponseData,
    CreateInteractionResponseFollowup, EditInteractionResponse,
};
use serenity::http::Http;
use serenity::model::application::command::{CommandOptionType, CommandType};
use serenity::model::application::component::{
    ActionRowComponent, ButtonStyle as SerenityButtonStyle, ComponentType, InputTextStyle,
};
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOption,
};
use serenity::model::application::interaction::autocomplete::AutocompleteInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, Member};
use serenity::model::id::{AttachmentId, ChannelId, GuildId, RoleId, UserId};
use serenity::model::user::User;
use serenity::prelude::{Context, EventHandler};
use serde_json::Value;

use crate::commands::sync::register_commands;
use crate::core::config::Config;
use crate::core::embeds::EmbedPayload;
use crate::dispatcher::Dispatcher;
use crate::events::{self, EventPayload, GatewayEvent};
use crate::interaction::{CommandOption, InboundInteraction, InteractionKind, OptionValue};
use crate::session::{
    ButtonStyle, Choice, ChoiceValue, ComponentRow, ComponentSpec, InputStyle, InteractionSession,
    MessagePayload, ModalPayload,
};

/// Convert serenity's option tree into typed options
///
/// Snowflake values arrive as strings and are parsed here. Autocomplete
/// sends the partially typed text of the focused option, so numeric kinds
/// fall back to the raw string.
pub fn convert_options(options: &[CommandDataOption]) -> Vec<CommandOption> {
    options
        .iter()
        .map(|option| CommandOption {
            name: option.name.clone(),
            value: convert_value(option),
            focused: option.focused,
        })
        .collect()
}

fn convert_value(option: &CommandDataOption) -> Option<OptionValue> {
    match option.kind {
        CommandOptionType::SubCommand => {
            return Some(OptionValue::SubCommand(convert_options(&option.options)));
        }
        // Groups are never registered; their nested subcommand is not routed
        CommandOptionType::SubCommandGroup => {
            warn!("Ignoring subcommand group '{}'", option.name);
            return None;
        }
        _ => {}
    }

    let value = option.value.as_ref()?;
    let id = || snowflake(value);
    let converted = match option.kind {
        CommandOptionType::String => value.as_str().map(|s| OptionValue::String(s.to_string())),
        CommandOptionType::Integer => value.as_i64().map(OptionValue::Integer),
        CommandOptionType::Number => value.as_f64().map(OptionValue::Number),
        CommandOptionType::Boolean => value.as_bool().map(OptionValue::Boolean),
        CommandOptionType::User => id().map(|id| OptionValue::User(UserId(id))),
        CommandOptionType::Channel => id().map(|id| OptionValue::Channel(ChannelId(id))),
        CommandOptionType::Role => id().map(|id| OptionValue::Role(RoleId(id))),
        CommandOptionType::Mentionable => id().map(OptionValue::Mentionable),
        CommandOptionType::Attachment => id().map(|id| OptionValue::Attachment(AttachmentId(id))),
        _ => None,
    };
    converted.or_else(|| value.as_str().map(|s| OptionValue::String(s.to_string())))
}

fn snowflake(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn base(kind: InteractionKind, key: &str, user: &User, member: Option<&Member>) -> InboundInteraction {
    let mut inbound = InboundInteraction::new(kind, key, user.id);
    inbound.user_name = user.name.clone();
    if let Some(member) = member {
        inbound.member_permissions = member.permissions;
        inbound.member_roles = member.roles.clone();
    }
    inbound
}

fn located(mut inbound: InboundInteraction, guild_id: Option<GuildId>, channel_id: ChannelId) -> InboundInteraction {
    inbound.guild_id = guild_id;
    inbound.channel_id = channel_id;
    inbound
}

enum RawInteraction {
    Command(ApplicationCommandInteraction),
    Component(MessageComponentInteraction),
    Modal(ModalSubmitInteraction),
    Autocomplete(AutocompleteInteraction),
}

/// Normalize a raw interaction and pair it with a session to answer it
///
/// `None` for pings and component types the dispatcher does not route.
pub fn classify(interaction: Interaction, http: Arc<Http>) -> Option<(InboundInteraction, SerenitySession)> {
    let (inbound, raw) = match interaction {
        Interaction::ApplicationCommand(command) => {
            let kind = match command.data.kind {
                CommandType::ChatInput => InteractionKind::ChatInputCommand,
                CommandType::User | CommandType::Message => InteractionKind::ContextMenuCommand,
                other => {
                    warn!("Unsupported command type {other:?} for '{}'", command.data.name);
                    return None;
                }
            };
            let mut inbound = base(kind, &command.data.name, &command.user, command.member.as_ref());
            inbound.options = convert_options(&command.data.options);
            inbound.target_id = command.data.target_id.map(|target| target.0);
            let inbound = located(inbound, command.guild_id, command.channel_id);
            (inbound, RawInteraction::Command(command))
        }
        Interaction::MessageComponent(component) => {
            let kind = match component.data.component_type {
                ComponentType::Button => InteractionKind::ButtonPress,
                ComponentType::SelectMenu => InteractionKind::SelectMenuPress,
                other => {
                    warn!("Unsupported component type {other:?} for '{}'", component.data.custom_id);
                    return None;
                }
            };
            let mut inbound = base(kind, &component.data.custom_id, &component.user, component.member.as_ref());
            inbound.values = component.data.values.clone();
            let inbound = located(inbound, component.guild_id, component.channel_id);
            (inbound, RawInteraction::Component(component))
        }
        Interaction::ModalSubmit(modal) => {
            let mut inbound = base(
                InteractionKind::ModalSubmit,
                &modal.data.custom_id,
                &modal.user,
                modal.member.as_ref(),
            );
            for row in &modal.data.components {
                for component in &row.components {
                    if let ActionRowComponent::InputText(input) = component {
                        inbound.fields.insert(input.custom_id.clone(), input.value.clone());
                    }
                }
            }
            let inbound = located(inbound, modal.guild_id, modal.channel_id);
            (inbound, RawInteraction::Modal(modal))
        }
        Interaction::Autocomplete(autocomplete) => {
            let mut inbound = base(
                InteractionKind::Autocomplete,
                &autocomplete.data.name,
                &autocomplete.user,
                autocomplete.member.as_ref(),
            );
            inbound.options = convert_options(&autocomplete.data.options);
            let inbound = located(inbound, autocomplete.guild_id, autocomplete.channel_id);
            (inbound, RawInteraction::Autocomplete(autocomplete))
        }
        Interaction::Ping(_) => return None,
    };

    Some((inbound, SerenitySession::new(raw, http)))
}

fn to_embed(payload: &EmbedPayload) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    if let Some(title) = &payload.title {
        embed.title(title);
    }
    if let Some(description) = &payload.description {
        embed.description(description);
    }
    if let Some(color) = payload.color {
        embed.color(color);
    }
    for field in &payload.fields {
        embed.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &payload.footer {
        embed.footer(|f| f.text(footer));
    }
    embed
}

fn button_style(style: ButtonStyle) -> SerenityButtonStyle {
    match style {
        ButtonStyle::Primary => SerenityButtonStyle::Primary,
        ButtonStyle::Secondary => SerenityButtonStyle::Secondary,
        ButtonStyle::Success => SerenityButtonStyle::Success,
        ButtonStyle::Danger => SerenityButtonStyle::Danger,
    }
}

fn to_components(rows: &[ComponentRow]) -> CreateComponents {
    let mut components = CreateComponents::default();
    for row in rows {
        components.create_action_row(|action_row| {
            for component in row {
                match component {
                    ComponentSpec::Button(button) => {
                        action_row.create_button(|b| {
                            b.custom_id(&button.custom_id)
                                .label(&button.label)
                                .style(button_style(button.style))
                                .disabled(button.disabled)
                        });
                    }
                    ComponentSpec::SelectMenu(menu) => {
                        action_row.create_select_menu(|s| {
                            s.custom_id(&menu.custom_id)
                                .min_values(menu.min_values)
                                .max_values(menu.max_values);
                            if let Some(placeholder) = &menu.placeholder {
                                s.placeholder(placeholder);
                            }
                            s.options(|opts| {
                                for option in &menu.options {
                                    opts.create_option(|o| {
                                        o.label(&option.label).value(&option.value);
                                        if let Some(description) = &option.description {
                                            o.description(description);
                                        }
                                        o
                                    });
                                }
                                opts
                            })
                        });
                    }
                }
            }
            action_row
        });
    }
    components
}

fn fill_data<'a, 'b>(
    data: &'b mut CreateInteractionResponseData<'a>,
    message: &MessagePayload,
) -> &'b mut CreateInteractionResponseData<'a> {
    if let Some(content) = &message.content {
        data.content(content);
    }
    for embed in &message.embeds {
        data.add_embed(to_embed(embed));
    }
    if let Some(rows) = &message.components {
        data.set_components(to_components(rows));
    }
    data.ephemeral(message.ephemeral.unwrap_or(false))
}

fn fill_edit<'b>(edit: &'b mut EditInteractionResponse, message: &MessagePayload) -> &'b mut EditInteractionResponse {
    if let Some(content) = &message.content {
        edit.content(content);
    }
    if !message.embeds.is_empty() {
        edit.set_embeds(message.embeds.iter().map(to_embed).collect());
    }
    if let Some(rows) = &message.components {
        edit.set_components(to_components(rows));
    }
    edit
}

fn fill_followup<'a, 'b>(
    followup: &'b mut CreateInteractionResponseFollowup<'a>,
    message: &MessagePayload,
) -> &'b mut CreateInteractionResponseFollowup<'a> {
    if let Some(content) = &message.content {
        followup.content(content);
    }
    for embed in &message.embeds {
        followup.add_embed(to_embed(embed));
    }
    if let Some(rows) = &message.components {
        followup.components(|c| {
            *c = to_components(rows);
            c
        });
    }
    followup.ephemeral(message.ephemeral.unwrap_or(false))
}

fn fill_modal<'a, 'b>(
    response: &'b mut CreateInteractionResponse<'a>,
    modal: &ModalPayload,
) -> &'b mut CreateInteractionResponse<'a> {
    response
        .kind(InteractionResponseType::Modal)
        .interaction_response_data(|d| {
            d.custom_id(&modal.custom_id).title(&modal.title).components(|c| {
                for input in &modal.inputs {
                    c.create_action_row(|row| {
                        row.create_input_text(|text| {
                            text.custom_id(&input.custom_id)
                                .label(&input.label)
                                .style(match input.style {
                                    InputStyle::Short => InputTextStyle::Short,
                                    InputStyle::Paragraph => InputTextStyle::Paragraph,
                                })
                                .required(input.required);
                            if let Some(placeholder) = &input.placeholder {
                                text.placeholder(placeholder);
                            }
                            text
                        })
                    });
                }
                c
            })
        })
}

/// Run the same response call on whichever interaction type is wrapped
macro_rules! respond {
    ($raw:expr, $i:ident => $call:expr) => {
        match $raw {
            RawInteraction::Command($i) => {
                $call.await?;
            }
            RawInteraction::Component($i) => {
                $call.await?;
            }
            RawInteraction::Modal($i) => {
                $call.await?;
            }
            RawInteraction::Autocomplete(_) => {
                bail!("autocomplete interactions can only be answered with choices")
            }
        }
    };
}

/// [`InteractionSession`] over a live serenity interaction
pub struct SerenitySession {
    raw: RawInteraction,
    http: Arc<Http>,
    replied: AtomicBool,
    deferred: AtomicBool,
}

impl SerenitySession {
    fn new(raw: RawInteraction, http: Arc<Http>) -> Self {
        Self {
            raw,
            http,
            replied: AtomicBool::new(false),
            deferred: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl InteractionSession for SerenitySession {
    fn is_replied(&self) -> bool {
        self.replied.load(Ordering::SeqCst)
    }

    fn is_deferred(&self) -> bool {
        self.deferred.load(Ordering::SeqCst)
    }

    async fn reply(&self, message: MessagePayload) -> Result<()> {
        respond!(&self.raw, i => i.create_interaction_response(&self.http, |r| {
            r.kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|d| fill_data(d, &message))
        }));
        self.replied.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn edit_reply(&self, message: MessagePayload) -> Result<()> {
        respond!(&self.raw, i => i.edit_original_interaction_response(&self.http, |r| fill_edit(r, &message)));
        self.replied.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn follow_up(&self, message: MessagePayload) -> Result<()> {
        respond!(&self.raw, i => i.create_followup_message(&self.http, |f| fill_followup(f, &message)));
        Ok(())
    }

    async fn defer(&self, ephemeral: bool) -> Result<()> {
        respond!(&self.raw, i => i.create_interaction_response(&self.http, |r| {
            r.kind(InteractionResponseType::DeferredChannelMessageWithSource)
                .interaction_response_data(|d| d.ephemeral(ephemeral))
        }));
        self.deferred.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn update(&self, message: MessagePayload) -> Result<()> {
        match &self.raw {
            RawInteraction::Component(component) => {
                component
                    .create_interaction_response(&self.http, |r| {
                        r.kind(InteractionResponseType::UpdateMessage)
                            .interaction_response_data(|d| fill_data(d, &message))
                    })
                    .await?;
            }
            _ => bail!("only component interactions can update their message"),
        }
        self.replied.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn defer_update(&self) -> Result<()> {
        match &self.raw {
            RawInteraction::Component(component) => {
                component
                    .create_interaction_response(&self.http, |r| {
                        r.kind(InteractionResponseType::DeferredUpdateMessage)
                    })
                    .await?;
            }
            _ => bail!("only component interactions can defer an update"),
        }
        self.deferred.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn show_modal(&self, modal: ModalPayload) -> Result<()> {
        match &self.raw {
            RawInteraction::Command(command) => {
                command
                    .create_interaction_response(&self.http, |r| fill_modal(r, &modal))
                    .await?;
            }
            RawInteraction::Component(component) => {
                component
                    .create_interaction_response(&self.http, |r| fill_modal(r, &modal))
                    .await?;
            }
            _ => bail!("modals can only be shown for commands and components"),
        }
        self.replied.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn autocomplete(&self, choices: Vec<Choice>) -> Result<()> {
        let RawInteraction::Autocomplete(autocomplete) = &self.raw else {
            bail!("only autocomplete interactions can answer with choices");
        };
        autocomplete
            .create_autocomplete_response(&self.http, |response| {
                for choice in &choices {
                    match &choice.value {
                        ChoiceValue::String(value) => response.add_string_choice(&choice.name, value),
                        ChoiceValue::Integer(value) => response.add_int_choice(&choice.name, *value),
                        ChoiceValue::Number(value) => response.add_number_choice(&choice.name, *value),
                    };
                }
                response
            })
            .await?;
        self.replied.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Serenity event handler feeding the dispatcher and the event bus
pub struct GatewayHandler {
    dispatcher: Arc<Dispatcher>,
    config: Arc<Config>,
}

impl GatewayHandler {
    pub fn new(dispatcher: Arc<Dispatcher>, config: Arc<Config>) -> Self {
        Self { dispatcher, config }
    }

    async fn emit(&self, ctx: Context, name: &str, payload: EventPayload) {
        self.dispatcher
            .events()
            .emit(GatewayEvent {
                name: name.to_string(),
                payload,
                client: Some(ctx),
            })
            .await;
    }
}

#[async_trait]
impl EventHandler for GatewayHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🔧 Running in {} mode", self.config.mode);

        if let Err(e) = register_commands(&ctx.http, &self.config, self.dispatcher.registry()).await {
            error!("Failed to register commands: {e:#}");
        }

        self.emit(ctx, events::READY, EventPayload::Ready(Box::new(ready))).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        debug!("Message {} in channel {}", msg.id, msg.channel_id);
        self.emit(ctx, events::MESSAGE_CREATE, EventPayload::Message(Box::new(msg)))
            .await;
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: bool) {
        debug!("Guild available: {} ({})", guild.name, guild.id);
        self.emit(
            ctx,
            events::GUILD_CREATE,
            EventPayload::GuildCreate {
                guild: Box::new(guild),
                is_new,
            },
        )
        .await;
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        self.emit(ctx, events::GUILD_MEMBER_ADD, EventPayload::MemberAdd(Box::new(new_member)))
            .await;
    }

    async fn reaction_add(&self, ctx: Context, add_reaction: Reaction) {
        self.emit(ctx, events::REACTION_ADD, EventPayload::ReactionAdd(Box::new(add_reaction)))
            .await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Some((inbound, session)) = classify(interaction, Arc::clone(&ctx.http)) else {
            return;
        };
        self.dispatcher
            .dispatch(inbound, Arc::new(session), Some(ctx))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::embeds::COLOR_SUCCESS;
    use crate::session::{ButtonSpec, SelectMenuSpec, SelectOptionSpec};
    use serde_json::json;

    fn option(value: serde_json::Value) -> CommandDataOption {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_convert_scalar_and_snowflake_options() {
        let options = vec![
            option(json!({"name": "text", "type": 3, "value": "hello"})),
            option(json!({"name": "count", "type": 4, "value": 3})),
            option(json!({"name": "ratio", "type": 10, "value": 0.5})),
            option(json!({"name": "flag", "type": 5, "value": true})),
            option(json!({"name": "who", "type": 6, "value": "80351110224678912"})),
            option(json!({"name": "where", "type": 7, "value": "41771983423143937"})),
        ];
        let converted = convert_options(&options);

        assert_eq!(converted[0].value, Some(OptionValue::String("hello".to_string())));
        assert_eq!(converted[1].value, Some(OptionValue::Integer(3)));
        assert_eq!(converted[2].value, Some(OptionValue::Number(0.5)));
        assert_eq!(converted[3].value, Some(OptionValue::Boolean(true)));
        assert_eq!(
            converted[4].value,
            Some(OptionValue::User(UserId(80351110224678912)))
        );
        assert_eq!(
            converted[5].value,
            Some(OptionValue::Channel(ChannelId(41771983423143937)))
        );
    }

    #[test]
    fn test_convert_subcommand_tree() {
        let options = vec![option(json!({
            "name": "view",
            "type": 1,
            "options": [{"name": "user", "type": 6, "value": "42"}]
        }))];
        let converted = convert_options(&options);

        assert_eq!(
            converted[0].value,
            Some(OptionValue::SubCommand(vec![CommandOption::new(
                "user",
                OptionValue::User(UserId(42))
            )]))
        );
    }

    #[test]
    fn test_subcommand_group_is_not_routed() {
        let options = vec![option(json!({
            "name": "settings",
            "type": 2,
            "options": [{"name": "set", "type": 1, "options": [{"name": "key", "type": 3, "value": "lang"}]}]
        }))];
        let converted = convert_options(&options);
        assert_eq!(converted[0].value, None);

        let inbound = InboundInteraction {
            options: converted,
            ..InboundInteraction::new(InteractionKind::ChatInputCommand, "config", UserId(1))
        };
        assert_eq!(inbound.subcommand(), None);
    }

    #[test]
    fn test_focused_partial_integer_falls_back_to_text() {
        let options = vec![option(json!({"name": "n", "type": 4, "value": "4", "focused": true}))];
        let converted = convert_options(&options);
        assert!(converted[0].focused);
        assert_eq!(converted[0].value, Some(OptionValue::String("4".to_string())));
    }

    #[test]
    fn test_embed_conversion() {
        let embed = to_embed(
            &EmbedPayload::new()
                .title("Done")
                .description("All good")
                .color(COLOR_SUCCESS)
                .field("Items", "3", true)
                .footer("page 1/1"),
        );
        assert_eq!(embed.0.get("title").unwrap(), "Done");
        assert_eq!(embed.0.get("description").unwrap(), "All good");
        assert_eq!(embed.0.get("color").unwrap(), COLOR_SUCCESS as u64);
        assert_eq!(embed.0.get("fields").unwrap().as_array().unwrap().len(), 1);
        assert_eq!(embed.0.get("footer").unwrap()["text"], "page 1/1");
    }

    #[test]
    fn test_component_conversion() {
        let rows = vec![
            vec![
                ComponentSpec::Button(ButtonSpec::new("page:1:prev", "◀", ButtonStyle::Secondary).disabled(true)),
                ComponentSpec::Button(ButtonSpec::new("page:1:next", "▶", ButtonStyle::Primary)),
            ],
            vec![ComponentSpec::SelectMenu(SelectMenuSpec {
                custom_id: "color".to_string(),
                placeholder: Some("Pick one".to_string()),
                options: vec![SelectOptionSpec {
                    label: "Red".to_string(),
                    value: "red".to_string(),
                    description: None,
                }],
                min_values: 1,
                max_values: 1,
            })],
        ];
        let components = to_components(&rows);
        assert_eq!(components.0.len(), 2);
    }
}
