//! Message dispatch.
//!
//! Every message goes through the same pipeline: validate the context against
//! its channel, run the pre-parse filters, parse, run the post-parse filters,
//! pick recipients, deliver, and write the chat log. A blocked message is
//! answered to the sender and stops there. A malformed context is an error for
//! the caller and nobody receives anything.

mod settings;
#[cfg(test)]
mod tests;

pub use settings::RelaySettings;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::account::{Account, AccountDirectory, AccountRef};
use crate::channel::{ChannelType, Context};
use crate::common::{AccountId, BlockMessage, ContextError, ContextResult, Permission, ServerName};
use crate::module::{ModuleKind, ModuleRegistry};
use crate::render::{Format, MarkupRenderer, PlainRenderer, RenderedMessage};
use crate::routing::{self, AccountPredicate};
use crate::sink::{ChatLogger, DeliverySink, TracingChatLogger};

/// What happened to a dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The message went out. `recipients` counts deliveries, including
    /// confirmations and spy copies.
    Delivered { recipients: usize },
    /// A filter blocked the message. The sender was told why.
    Blocked { reason: RenderedMessage },
    /// The target does not accept the message. The sender was told why.
    Refused { reason: RenderedMessage },
}

type RecipientBuilder = fn(&Dispatcher, &Context) -> ContextResult<AccountPredicate>;

/// Base audience of each channel, before ignore and vanish rules apply.
fn recipient_builder(channel: ChannelType) -> RecipientBuilder {
    match channel {
        ChannelType::Global => Dispatcher::global_recipients,
        ChannelType::Local => Dispatcher::local_recipients,
        ChannelType::Multicast => Dispatcher::multicast_recipients,
        ChannelType::Staff => Dispatcher::staff_recipients,
        ChannelType::Private => Dispatcher::private_recipients,
        ChannelType::Join => Dispatcher::join_recipients,
        ChannelType::Leave => Dispatcher::leave_recipients,
        ChannelType::Switch => Dispatcher::switch_recipients,
        ChannelType::Alert => Dispatcher::alert_recipients,
    }
}

/// Routes messages from senders to recipients.
///
/// Owned by the application root and shared by reference. Safe to call from
/// many threads at once.
pub struct Dispatcher {
    directory: Arc<dyn AccountDirectory>,
    delivery: Arc<dyn DeliverySink>,
    chat_log: Arc<dyn ChatLogger>,
    renderer: Arc<dyn MarkupRenderer>,
    modules: Arc<ModuleRegistry>,
    settings: RelaySettings,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<dyn AccountDirectory>,
        delivery: Arc<dyn DeliverySink>,
        modules: Arc<ModuleRegistry>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            directory,
            delivery,
            chat_log: Arc::new(TracingChatLogger),
            renderer: Arc::new(PlainRenderer),
            modules,
            settings,
        }
    }

    pub fn with_chat_logger(mut self, chat_log: Arc<dyn ChatLogger>) -> Self {
        self.chat_log = chat_log;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn MarkupRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn modules(&self) -> &Arc<ModuleRegistry> {
        &self.modules
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    fn resolve(&self, id: AccountId) -> ContextResult<AccountRef> {
        self.directory
            .resolve(id)
            .ok_or(ContextError::UnknownAccount { id })
    }

    /// Send a chat line on `channel`, or on the sender's chosen channel.
    pub fn send_message(
        &self,
        sender: AccountId,
        channel: Option<ChannelType>,
        message: &str,
    ) -> ContextResult<Outcome> {
        let mut ctx = Context::for_sender(self.resolve(sender)?).with_message(message);
        if let Some(channel) = channel {
            ctx.set_channel(channel);
        }
        self.dispatch(ctx)
    }

    pub fn send_private_message(
        &self,
        sender: AccountId,
        target: AccountId,
        message: &str,
    ) -> ContextResult<Outcome> {
        let ctx = Context::for_sender(self.resolve(sender)?)
            .with_target(self.resolve(target)?)
            .with_message(message)
            .with_channel(ChannelType::Private);
        self.dispatch(ctx)
    }

    pub fn send_alert(&self, sender: AccountId, message: &str) -> ContextResult<Outcome> {
        self.send_message(sender, Some(ChannelType::Alert), message)
    }

    pub fn send_join_message(&self, player: AccountId) -> ContextResult<Outcome> {
        let ctx = Context::for_sender(self.resolve(player)?).with_channel(ChannelType::Join);
        self.dispatch(ctx)
    }

    pub fn send_leave_message(&self, player: AccountId) -> ContextResult<Outcome> {
        let ctx = Context::for_sender(self.resolve(player)?).with_channel(ChannelType::Leave);
        self.dispatch(ctx)
    }

    pub fn send_switch_message(
        &self,
        player: AccountId,
        server: ServerName,
    ) -> ContextResult<Outcome> {
        let ctx = Context::for_sender(self.resolve(player)?)
            .with_server(server)
            .with_channel(ChannelType::Switch);
        self.dispatch(ctx)
    }

    /// Run a caller-built context through the pipeline of its channel.
    ///
    /// Without a channel the sender's preference applies, then the configured default.
    pub fn dispatch(&self, mut ctx: Context) -> ContextResult<Outcome> {
        let channel = self.resolve_channel(&ctx);
        ctx.set_channel(channel);

        let result = match channel {
            ChannelType::Global => self.send_broadcast(ctx, channel, Format::GlobalChat, true),
            ChannelType::Local => self.send_local(ctx),
            ChannelType::Multicast => {
                self.send_broadcast(ctx, channel, Format::MulticastChat, true)
            }
            ChannelType::Staff => self.send_broadcast(ctx, channel, Format::StaffChat, true),
            ChannelType::Alert => self.send_broadcast(ctx, channel, Format::Alert, false),
            ChannelType::Private => self.send_private(ctx),
            ChannelType::Join => self.send_presence(ctx, channel, Format::JoinMessage),
            ChannelType::Leave => self.send_presence(ctx, channel, Format::LeaveMessage),
            ChannelType::Switch => self.send_presence(ctx, channel, Format::ServerSwitch),
        };

        match &result {
            Ok(outcome) => debug!(channel = channel.label(), ?outcome, "Dispatched message"),
            Err(e) => warn!(channel = channel.label(), "Rejected message context: {}", e),
        }
        result
    }

    fn resolve_channel(&self, ctx: &Context) -> ChannelType {
        ctx.channel()
            .or_else(|| ctx.sender().and_then(|sender| sender.channel_type()))
            .unwrap_or(self.settings.default_channel)
    }

    fn global_recipients(&self, _ctx: &Context) -> ContextResult<AccountPredicate> {
        if !self.modules.is_active(ModuleKind::GlobalChat) {
            return Ok(AccountPredicate::always());
        }
        Ok(routing::global(self.settings.global_server_list.as_deref()))
    }

    fn local_recipients(&self, ctx: &Context) -> ContextResult<AccountPredicate> {
        Ok(routing::server(Some(ctx.require_server()?)))
    }

    /// Direct multicast reaches the sender's server and, while the module is active, its group.
    fn multicast_recipients(&self, ctx: &Context) -> ContextResult<AccountPredicate> {
        let server = ctx.require_server()?;
        if !self.modules.is_active(ModuleKind::MulticastChat) {
            return Ok(routing::server(Some(server)));
        }
        Ok(routing::inclusive_multicast(
            &self.settings.multicast_groups,
            Some(server),
        ))
    }

    fn staff_recipients(&self, _ctx: &Context) -> ContextResult<AccountPredicate> {
        Ok(routing::permission(Permission::StaffChatView))
    }

    fn private_recipients(&self, ctx: &Context) -> ContextResult<AccountPredicate> {
        Ok(routing::account(ctx.require_target()?.id()))
    }

    fn join_recipients(&self, _ctx: &Context) -> ContextResult<AccountPredicate> {
        Ok(routing::permission(Permission::JoinMessageView))
    }

    fn leave_recipients(&self, _ctx: &Context) -> ContextResult<AccountPredicate> {
        Ok(routing::permission(Permission::LeaveMessageView))
    }

    fn switch_recipients(&self, _ctx: &Context) -> ContextResult<AccountPredicate> {
        Ok(routing::permission(Permission::SwitchMessageView))
    }

    fn alert_recipients(&self, _ctx: &Context) -> ContextResult<AccountPredicate> {
        Ok(AccountPredicate::always())
    }

    /// Channel audience narrowed by the ignore and vanish rules.
    fn recipients(&self, channel: ChannelType, ctx: &Context) -> ContextResult<AccountPredicate> {
        let sender = ctx.require_sender()?;
        let mut predicate = recipient_builder(channel)(self, ctx)?;
        if channel.is_ignorable() && self.modules.is_active(ModuleKind::Ignoring) {
            predicate = predicate.and(routing::not_ignored(sender.as_ref()));
        }
        if channel.respects_vanish() && sender.is_vanished() {
            predicate = predicate.and(routing::vanish_visible());
        }
        Ok(predicate)
    }

    /// Filter and parse the context's message.
    ///
    /// Returns the block if a filter refused it. Filters are skipped when
    /// `run_filters` is false but the message is still parsed.
    fn parse(&self, ctx: &mut Context, run_filters: bool) -> ContextResult<Option<BlockMessage>> {
        let sender = Arc::clone(ctx.require_sender()?);
        let raw = ctx.require_message()?.to_string();
        let filters = self.modules.filters();

        let text = if run_filters {
            match filters.apply_pre_parse(sender.as_ref(), raw) {
                Ok(text) => {
                    ctx.set_filtered_message(text.clone())?;
                    text
                }
                Err(block) => return Ok(Some(block)),
            }
        } else {
            raw
        };

        let mut rendered = self.renderer.parse(&text);
        if run_filters {
            rendered = match filters.apply_post_parse(sender.as_ref(), rendered) {
                Ok(rendered) => rendered,
                Err(block) => return Ok(Some(block)),
            };
        }

        ctx.set_rendered_message(rendered)?;
        Ok(None)
    }

    /// Validate, filter and parse. `Some` means the pipeline stops with that outcome.
    fn prepare(
        &self,
        ctx: &mut Context,
        channel: ChannelType,
        run_filters: bool,
    ) -> ContextResult<Option<Outcome>> {
        channel.check_structure(ctx)?;
        if let Some(block) = self.parse(ctx, run_filters)? {
            let sender = ctx.require_sender()?;
            return Ok(Some(self.blocked(sender.as_ref(), block)));
        }
        channel.check_progress(ctx)?;
        Ok(None)
    }

    fn blocked(&self, sender: &dyn Account, block: BlockMessage) -> Outcome {
        debug!(sender = sender.id(), reason = %block.reason, "Message blocked");
        self.delivery.deliver(sender, &block.reason);
        Outcome::Blocked {
            reason: block.reason,
        }
    }

    fn refused(&self, sender: &dyn Account, notice: &str) -> Outcome {
        let reason = RenderedMessage::text(notice);
        debug!(sender = sender.id(), reason = %reason, "Message refused");
        self.delivery.deliver(sender, &reason);
        Outcome::Refused { reason }
    }

    fn render(&self, format: Format, ctx: &Context) -> RenderedMessage {
        self.renderer.render(self.settings.formats.get(format), ctx)
    }

    /// Deliver to every connected account accepted by `predicate`.
    fn fan_out(&self, message: &RenderedMessage, predicate: &AccountPredicate) -> usize {
        let recipients = routing::select(self.directory.connected_accounts(), predicate);
        for recipient in &recipients {
            self.delivery.deliver(recipient.as_ref(), message);
        }
        recipients.len()
    }

    /// Chat log failures never affect delivery.
    fn log(&self, label: &str, ctx: &Context) {
        if !self.modules.is_active(ModuleKind::ChatLogging) {
            return;
        }
        if let Err(e) = self.chat_log.log_message(label, ctx) {
            warn!(label, "Failed to write chat log: {}", e);
        }
    }

    fn log_channel(&self, channel: ChannelType, ctx: &Context) {
        if channel.is_loggable() {
            self.log(channel.label(), ctx);
        }
    }

    /// Global, staff, alert and direct multicast messages.
    fn send_broadcast(
        &self,
        mut ctx: Context,
        channel: ChannelType,
        format: Format,
        run_filters: bool,
    ) -> ContextResult<Outcome> {
        if let Some(outcome) = self.prepare(&mut ctx, channel, run_filters)? {
            return Ok(outcome);
        }
        let predicate = self.recipients(channel, &ctx)?;
        let recipients = self.fan_out(&self.render(format, &ctx), &predicate);
        self.log_channel(channel, &ctx);
        Ok(Outcome::Delivered { recipients })
    }

    /// Local chat, then the multicast relay to linked servers, then local spies.
    fn send_local(&self, mut ctx: Context) -> ContextResult<Outcome> {
        if let Some(outcome) = self.prepare(&mut ctx, ChannelType::Local, true)? {
            return Ok(outcome);
        }
        let sender = Arc::clone(ctx.require_sender()?);
        let server = ctx.require_server()?.clone();

        let predicate = self.recipients(ChannelType::Local, &ctx)?;
        let mut recipients = self.fan_out(&self.render(Format::LocalChat, &ctx), &predicate);
        self.log_channel(ChannelType::Local, &ctx);

        let multicast = self.modules.is_active(ModuleKind::MulticastChat);
        if multicast {
            recipients += self.relay_multicast(&mut ctx, &server)?;
        }

        if self.modules.is_active(ModuleKind::Spy)
            && !sender.has_permission(Permission::LocalSpyExempt)
        {
            let reached = if multicast {
                routing::inclusive_multicast(&self.settings.multicast_groups, Some(&server))
            } else {
                routing::server(Some(&server))
            };
            let mut spies = routing::local_spy().and(reached.negate());
            if self.modules.is_active(ModuleKind::Ignoring) {
                spies = spies.and(routing::not_ignored(sender.as_ref()));
            }
            recipients += self.fan_out(&self.render(Format::LocalSpy, &ctx), &spies);
        }

        Ok(Outcome::Delivered { recipients })
    }

    /// Second phase of local chat: copies for the other servers of the sender's group.
    fn relay_multicast(&self, ctx: &mut Context, source: &ServerName) -> ContextResult<usize> {
        ctx.set_channel(ChannelType::Multicast);
        ChannelType::Multicast.check_requirements(ctx)?;
        let predicate = self
            .recipients(ChannelType::Multicast, ctx)?
            .and(routing::server(Some(source)).negate());
        let recipients = self.fan_out(&self.render(Format::MulticastChat, ctx), &predicate);
        self.log_channel(ChannelType::Multicast, ctx);
        ctx.set_channel(ChannelType::Local);
        Ok(recipients)
    }

    fn send_private(&self, mut ctx: Context) -> ContextResult<Outcome> {
        ChannelType::Private.check_structure(&ctx)?;
        let sender = Arc::clone(ctx.require_sender()?);
        let target = Arc::clone(ctx.require_target()?);
        let notices = &self.settings.notices;

        if target.has_ignored(sender.id()) && !sender.has_permission(Permission::BypassIgnore)
        {
            return Ok(self.refused(sender.as_ref(), &notices.has_ignored));
        }
        if !target.messenger_enabled() && !sender.has_permission(Permission::BypassMessenger) {
            return Ok(self.refused(sender.as_ref(), &notices.messenger_disabled));
        }

        if let Some(block) = self.parse(&mut ctx, self.settings.filter_private_messages)? {
            return Ok(self.blocked(sender.as_ref(), block));
        }
        ChannelType::Private.check_progress(&ctx)?;

        self.delivery
            .deliver(sender.as_ref(), &self.render(Format::MessageSender, &ctx));
        let mut recipients = 1;

        let predicate = self.recipients(ChannelType::Private, &ctx)?;
        recipients += self.fan_out(&self.render(Format::MessageTarget, &ctx), &predicate);

        if self.modules.is_active(ModuleKind::Spy)
            && !sender.has_permission(Permission::SocialSpyExempt)
        {
            let spies = routing::social_spy()
                .and(routing::not_account(sender.id()))
                .and(routing::not_account(target.id()));
            recipients += self.fan_out(&self.render(Format::SocialSpy, &ctx), &spies);
        }

        if ChannelType::Private.is_loggable() && self.settings.log_private_messages {
            self.log(&format!("PM to {}", target.name()), &ctx);
        }

        Ok(Outcome::Delivered { recipients })
    }

    /// Join, leave and switch notices. The text comes from the template alone.
    fn send_presence(
        &self,
        mut ctx: Context,
        channel: ChannelType,
        format: Format,
    ) -> ContextResult<Outcome> {
        channel.check_structure(&ctx)?;
        let rendered = self.render(format, &ctx);
        ctx.set_rendered_message(rendered.clone())?;
        channel.check_progress(&ctx)?;

        let predicate = self.recipients(channel, &ctx)?;
        let recipients = self.fan_out(&rendered, &predicate);
        self.log_channel(channel, &ctx);
        Ok(Outcome::Delivered { recipients })
    }
}
