use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::Result;
use sqlx::PgPool;

use crate::bity::{BityClient, Config as BityConfig, FiatProvider};
use crate::ethereum::paraswap::{
    Config as ParaswapConfig, ParaswapQuoteService, ParaswapSwapService, ParaswapTokenRepository,
    QuoteService, SwapService, TokenRepository,
};
use crate::ethereum::{AlloyClient, RpcWallet, Wallet};
use crate::interactor::db::{OrderRepository, PgOrderRepository, PgUserRepository, UserRepository};
use crate::interactor::{
    ExecutorOptions, OrderInteractor, OrderInteractorImpl, PaymentInteractorImpl,
    ProfitShareInteractor, ProfitShareInteractorImpl, RateInteractor, RateInteractorImpl,
};
use crate::presenter::PaymentPresenterImpl;
use crate::router::{ApiState, TokenVerifier};
use crate::services::OrderWatchService;
use crate::settings::Settings;
use crate::view::PaymentView;

/// ServiceContainer provides access to core application dependencies
pub struct ServiceContainer {
    // Core services
    db_pool: Arc<PgPool>,
    ethereum_client: Arc<AlloyClient>,

    // ParaSwap services
    token_repository: Arc<dyn TokenRepository>,
    quote_service: Arc<dyn QuoteService>,
    swap_service: Arc<dyn SwapService>,

    // Bity
    fiat_provider: Arc<dyn FiatProvider>,

    // Repositories
    user_repository: Arc<dyn UserRepository>,
    order_repository: Arc<dyn OrderRepository>,

    // Interactors
    rate_interactor: Arc<dyn RateInteractor>,
    order_interactor: Arc<dyn OrderInteractor>,
    profit_share_interactor: Arc<dyn ProfitShareInteractor>,

    order_watch_service: Arc<OrderWatchService>,
    token_verifier: Arc<TokenVerifier>,
}

impl ServiceContainer {
    /// Wire every service from the settings and an open database pool
    pub fn new(
        settings: &Settings,
        db_pool: Arc<PgPool>,
        ethereum_client: Arc<AlloyClient>,
    ) -> Result<Self> {
        let paraswap_config = ParaswapConfig::from_env();
        let bity_config = BityConfig::from_env();

        let token_repository: Arc<dyn TokenRepository> =
            Arc::new(ParaswapTokenRepository::new(paraswap_config.clone()));
        let quote_service: Arc<dyn QuoteService> =
            Arc::new(ParaswapQuoteService::new(paraswap_config.clone()));
        let swap_service: Arc<dyn SwapService> =
            Arc::new(ParaswapSwapService::new(paraswap_config));
        let fiat_provider: Arc<dyn FiatProvider> = Arc::new(BityClient::new(bity_config));

        let user_repository: Arc<dyn UserRepository> =
            Arc::new(PgUserRepository::new(db_pool.as_ref().clone()));
        let order_repository: Arc<dyn OrderRepository> =
            Arc::new(PgOrderRepository::new(db_pool.as_ref().clone()));

        let rate_interactor: Arc<dyn RateInteractor> = Arc::new(RateInteractorImpl::new(
            quote_service.clone(),
            token_repository.clone(),
            fiat_provider.clone(),
        ));
        let order_interactor: Arc<dyn OrderInteractor> = Arc::new(OrderInteractorImpl::new(
            fiat_provider.clone(),
            order_repository.clone(),
        ));
        let profit_share_interactor: Arc<dyn ProfitShareInteractor> =
            Arc::new(ProfitShareInteractorImpl::new(
                user_repository.clone(),
                order_repository.clone(),
                settings.partner_fee()?,
                settings.referral_sharing()?,
            ));

        let order_watch_service = Arc::new(OrderWatchService::new(
            fiat_provider.clone(),
            settings.order_poll_interval(),
        ));
        let token_verifier = Arc::new(TokenVerifier::new(&settings.auth_secret));

        Ok(Self {
            db_pool,
            ethereum_client,
            token_repository,
            quote_service,
            swap_service,
            fiat_provider,
            user_repository,
            order_repository,
            rate_interactor,
            order_interactor,
            profit_share_interactor,
            order_watch_service,
            token_verifier,
        })
    }

    // Accessor methods

    pub fn db_pool(&self) -> Arc<PgPool> {
        self.db_pool.clone()
    }

    pub fn ethereum_client(&self) -> Arc<AlloyClient> {
        self.ethereum_client.clone()
    }

    pub fn token_repository(&self) -> Arc<dyn TokenRepository> {
        self.token_repository.clone()
    }

    pub fn quote_service(&self) -> Arc<dyn QuoteService> {
        self.quote_service.clone()
    }

    pub fn swap_service(&self) -> Arc<dyn SwapService> {
        self.swap_service.clone()
    }

    pub fn fiat_provider(&self) -> Arc<dyn FiatProvider> {
        self.fiat_provider.clone()
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        self.user_repository.clone()
    }

    pub fn order_repository(&self) -> Arc<dyn OrderRepository> {
        self.order_repository.clone()
    }

    pub fn rate_interactor(&self) -> Arc<dyn RateInteractor> {
        self.rate_interactor.clone()
    }

    pub fn order_interactor(&self) -> Arc<dyn OrderInteractor> {
        self.order_interactor.clone()
    }

    pub fn profit_share_interactor(&self) -> Arc<dyn ProfitShareInteractor> {
        self.profit_share_interactor.clone()
    }

    pub fn order_watch_service(&self) -> Arc<OrderWatchService> {
        self.order_watch_service.clone()
    }

    pub fn token_verifier(&self) -> Arc<TokenVerifier> {
        self.token_verifier.clone()
    }

    /// State shared by the HTTP handlers
    pub fn api_state(&self) -> ApiState {
        ApiState {
            order_interactor: self.order_interactor(),
            profit_share_interactor: self.profit_share_interactor(),
            token_verifier: self.token_verifier(),
        }
    }

    /// Wallet backed by an account unlocked on the RPC node
    pub fn wallet(&self, address: Address) -> Arc<dyn Wallet> {
        Arc::new(RpcWallet::new(self.ethereum_client(), address))
    }

    /// Payment executor signing with `wallet`
    pub fn payment_interactor(&self, wallet: Arc<dyn Wallet>) -> PaymentInteractorImpl {
        PaymentInteractorImpl::new(
            self.ethereum_client.clone(),
            wallet,
            self.swap_service(),
            self.fiat_provider(),
            self.order_interactor(),
            ExecutorOptions::default(),
        )
    }

    /// Payment flow for `wallet`, reporting progress to `view`
    pub fn payment_presenter<V: PaymentView>(
        &self,
        wallet: Arc<dyn Wallet>,
        view: Arc<V>,
    ) -> PaymentPresenterImpl<PaymentInteractorImpl, V> {
        PaymentPresenterImpl::new(
            Arc::new(self.payment_interactor(wallet)),
            view,
            self.order_watch_service(),
        )
    }
}
