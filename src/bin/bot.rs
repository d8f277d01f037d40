use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use dotenvy::dotenv;
use log::{error, info};
use serenity::model::id::UserId;
use serenity::prelude::{Client, GatewayIntents};

use dispatchkit::commands::{
    AutocompleteHandler, CommandDescriptor, CommandKind, EventDescriptor, InteractionContext,
    InteractionHandler, ModalDescriptor, OptionKind, OptionSpec, SubcommandDescriptor,
};
use dispatchkit::core::{info_embed, success_embed, Config};
use dispatchkit::events::{self, EventListener, EventPayload, GatewayEvent};
use dispatchkit::guards::{Cooldown, OwnerOnly, RateLimiter};
use dispatchkit::session::{Choice, InputStyle, ModalPayload};
use dispatchkit::{Dispatcher, EventBus, GatewayHandler, HandlerRegistry, Paginator};

const COLORS: &[&str] = &[
    "red", "orange", "yellow", "green", "teal", "blue", "indigo", "violet", "pink", "black", "white",
];

type Bios = Arc<DashMap<UserId, String>>;

struct Ping;

#[async_trait]
impl InteractionHandler for Ping {
    async fn run(&self, ctx: &InteractionContext) -> Result<()> {
        ctx.reply("🏓 Pong!").await
    }
}

struct Admin {
    started: std::time::Instant,
}

#[async_trait]
impl InteractionHandler for Admin {
    async fn run(&self, ctx: &InteractionContext) -> Result<()> {
        let uptime = self.started.elapsed().as_secs();
        ctx.reply(info_embed(
            "🔧 Admin",
            &format!("Uptime: {}h {}m", uptime / 3600, (uptime % 3600) / 60),
        ))
        .await
    }
}

struct ProfileView {
    bios: Bios,
}

#[async_trait]
impl InteractionHandler for ProfileView {
    async fn run(&self, ctx: &InteractionContext) -> Result<()> {
        let user = ctx.args().user("user").unwrap_or_else(|| ctx.user_id());
        let bio = self
            .bios
            .get(&user)
            .map(|bio| bio.value().clone())
            .unwrap_or_else(|| "No bio yet.".to_string());
        ctx.reply(info_embed("Profile", &format!("<@{user}>\n\n{bio}"))).await
    }
}

struct ProfileEdit;

#[async_trait]
impl InteractionHandler for ProfileEdit {
    async fn run(&self, ctx: &InteractionContext) -> Result<()> {
        ctx.show_modal(
            ModalPayload::new("profile_edit", "Edit your profile").input(
                "bio",
                "Bio",
                InputStyle::Paragraph,
                true,
            ),
        )
        .await
    }
}

struct ProfileSubmit {
    bios: Bios,
}

#[async_trait]
impl InteractionHandler for ProfileSubmit {
    async fn run(&self, ctx: &InteractionContext) -> Result<()> {
        let bio = ctx.field("bio").unwrap_or_default().trim().to_string();
        self.bios.insert(ctx.user_id(), bio);
        ctx.reply(success_embed("✅ Profile updated")).await
    }
}

struct Help {
    paginator: Arc<Paginator>,
}

#[async_trait]
impl InteractionHandler for Help {
    async fn run(&self, ctx: &InteractionContext) -> Result<()> {
        let pages = vec![
            info_embed("Help: basics", "`/ping` checks that the bot is alive."),
            info_embed("Help: profiles", "`/profile view` and `/profile edit` manage your bio."),
            info_embed("Help: colors", "`/color` suggests colors as you type."),
        ];
        ctx.reply(self.paginator.start(ctx.user_id(), pages)).await
    }
}

struct Color;

#[async_trait]
impl InteractionHandler for Color {
    async fn run(&self, ctx: &InteractionContext) -> Result<()> {
        let name = ctx.args().string("name").unwrap_or("none");
        ctx.reply(format!("🎨 You picked **{name}**")).await
    }
}

#[async_trait]
impl AutocompleteHandler for Color {
    async fn complete(&self, ctx: &InteractionContext) -> Result<Vec<Choice>> {
        let typed = ctx.args().focused_text().unwrap_or_default().to_lowercase();
        Ok(COLORS
            .iter()
            .filter(|color| color.starts_with(&typed))
            .map(|color| Choice::string(*color, *color))
            .collect())
    }
}

struct UserInfo;

#[async_trait]
impl InteractionHandler for UserInfo {
    async fn run(&self, ctx: &InteractionContext) -> Result<()> {
        match ctx.target_id() {
            Some(target) => ctx.reply(format!("👤 User id: `{target}`")).await,
            None => ctx.reply("No target user.").await,
        }
    }
}

struct ReadyLog;

#[async_trait]
impl EventListener for ReadyLog {
    async fn handle(&self, event: &GatewayEvent) -> Result<()> {
        if let EventPayload::Ready(ready) = &event.payload {
            info!("👋 First ready as {}", ready.user.name);
        }
        Ok(())
    }
}

struct MemberJoinLog;

#[async_trait]
impl EventListener for MemberJoinLog {
    async fn handle(&self, event: &GatewayEvent) -> Result<()> {
        if let EventPayload::MemberAdd(member) = &event.payload {
            info!("➕ {} joined guild {}", member.user.name, member.guild_id);
        }
        Ok(())
    }
}

fn build_registry(config: &Config) -> Result<HandlerRegistry> {
    let bios: Bios = Arc::new(DashMap::new());
    let paginator = Arc::new(Paginator::new(Duration::from_secs(600)));
    let admin_limiter = Arc::new(RateLimiter::new(3, Duration::from_secs(60)));
    let color = Arc::new(Color);

    let mut registry = HandlerRegistry::new(EventBus::new());

    registry.register(CommandDescriptor::slash("ping", "Check that the bot is alive", Arc::new(Ping)))?;
    registry.register(
        CommandDescriptor::slash(
            "admin",
            "Owner tools",
            Arc::new(Admin {
                started: std::time::Instant::now(),
            }),
        )
        .guard(Arc::new(OwnerOnly::new(config.owner_ids.iter().copied())))
        .guard(Arc::new(Cooldown::new(admin_limiter)))
        .ephemeral(),
    )?;
    registry.register(CommandDescriptor::group(
        "profile",
        "Manage your profile",
        vec![
            SubcommandDescriptor::new("view", "Show a profile", Arc::new(ProfileView { bios: bios.clone() }))
                .option(OptionSpec::new("user", "Whose profile", OptionKind::User)),
            SubcommandDescriptor::new("edit", "Edit your bio", Arc::new(ProfileEdit)),
        ],
    ))?;
    registry.register(ModalDescriptor::new("profile_edit", Arc::new(ProfileSubmit { bios })).ephemeral())?;
    registry.register(CommandDescriptor::slash(
        "help",
        "Show help",
        Arc::new(Help {
            paginator: paginator.clone(),
        }),
    ))?;
    registry.register(paginator.descriptor())?;
    registry.register(
        CommandDescriptor::slash("color", "Pick a color", color.clone())
            .option(
                OptionSpec::new("name", "Color name", OptionKind::String)
                    .required()
                    .autocomplete(),
            )
            .autocomplete(color),
    )?;
    registry.register(CommandDescriptor::context_menu("User Info", CommandKind::User, Arc::new(UserInfo)))?;
    registry.register(EventDescriptor::once("ready_log", events::READY, Arc::new(ReadyLog)))?;
    registry.register(EventDescriptor::on(
        "member_join_log",
        events::GUILD_MEMBER_ADD,
        Arc::new(MemberJoinLog),
    ))?;

    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting bot in {} mode...", config.mode);

    let registry = build_registry(&config)?;
    info!("📋 {} handlers registered", registry.len());

    let dispatcher = Arc::new(Dispatcher::new(registry, config.dispatch_options()));
    let config = Arc::new(config);
    let handler = GatewayHandler::new(dispatcher, config.clone());

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::GUILD_MEMBERS;

    let mut client = Client::builder(&config.discord_token, intents)
        .application_id(config.application_id)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    if let Err(why) = client.start().await {
        error!("Client error: {why:?}");
    }

    Ok(())
}
