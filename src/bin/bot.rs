use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, UnavailableGuild};
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;

use daisy::commands::handlers::create_registry;
use daisy::commands::{register_commands, BotUser, CommandContext};
use daisy::core::{logging, Config, DebugSwitch};
use daisy::database::{Database, Store};
use daisy::features::ai::{AiQueue, OpenAiProvider, QueueSettings};
use daisy::gateway::{handle_command, handle_message, GatewayPresence};

struct Handler {
    state: Arc<CommandContext>,
    guild_id: Option<GuildId>,
}

impl Handler {
    fn new(state: Arc<CommandContext>, guild_id: Option<GuildId>) -> Self {
        Handler { state, guild_id }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        handle_message(&self.state, &ctx, &msg).await;
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        self.state.set_bot_user(BotUser {
            id: ready.user.id.to_string(),
            username: ready.user.name.clone(),
        });
        self.state.set_guilds(ready.guilds.len());

        // Register slash commands - use guild commands for development (instant), global for production
        match self.guild_id {
            Some(guild_id) => info!("🔧 Development mode: Registering commands for guild {guild_id}"),
            None => info!("🌍 Production mode: Registering commands globally"),
        }
        if let Err(e) = register_commands(&ctx, &self.state.registry, self.guild_id).await {
            error!("❌ Failed to register slash commands: {e}");
        }

        let presence = &self.state.presence;
        presence.attach(Arc::new(GatewayPresence::new(ctx.clone()))).await;
        // the first tick fires immediately
        presence.spawn_rotation(self.state.config.status_interval);
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: bool) {
        if is_new {
            self.state.guild_joined();
            info!("🆕 Joined new guild: {} ({})", guild.name, guild.id);
        } else {
            debug!("📥 Guild available: {} ({})", guild.name, guild.id);
        }
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, full: Option<Guild>) {
        if incomplete.unavailable {
            warn!("Guild {} became unavailable", incomplete.id);
            return;
        }
        self.state.guild_left();
        match full {
            Some(guild) => info!("👋 Removed from guild: {} ({})", guild.name, guild.id),
            None => info!("👋 Removed from guild {}", incomplete.id),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::ApplicationCommand(command) = interaction {
            handle_command(&self.state, &ctx, command).await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    // The openai crate reads its key from the environment
    if let Some(key) = &config.openai_api_key {
        std::env::set_var("OPENAI_API_KEY", key);
        std::env::set_var("OPENAI_KEY", key);
    }

    let log_level = logging::init(&config.log_level);

    info!("Starting {}...", config.bot_name);

    let database: Arc<dyn Store> = Arc::new(Database::new(&config.database_path).await?);
    let registry = create_registry()?;
    info!("📜 {} commands registered", registry.len());

    let ai = if config.ai_enabled() {
        let provider = Arc::new(OpenAiProvider::new(&config.openai_model));
        Some(AiQueue::new(provider, QueueSettings::from_config(&config)))
    } else {
        warn!("OPENAI_API_KEY is not set, AI replies are disabled");
        None
    };

    let guild_id = config
        .discord_guild_id
        .as_ref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(GuildId);
    let token = config.discord_token.clone();

    let state = Arc::new(
        CommandContext::new(config, registry, database, ai).with_debug(DebugSwitch::new(log_level)),
    );
    state.load_caches().await?;

    let handler = Handler::new(state, guild_id);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
