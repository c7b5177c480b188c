//! On-chain interfaces the client talks to.
use alloy::sol;

sol! {
    /// The smart wallet / forwarder that verifies and executes enveloping requests.
    #[sol(rpc)]
    #[derive(Debug)]
    interface IForwarder {
        /// Returns the next nonce the forwarder accepts.
        function nonce() external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

sol! {
    /// The hub relays submit enveloping requests through.
    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    interface IRelayHub {
        struct RelayData {
            uint256 gasPrice;
            address feesReceiver;
            address callForwarder;
            address callVerifier;
        }

        struct ForwardRequest {
            address relayHub;
            address from;
            address to;
            address tokenContract;
            uint256 value;
            uint256 gas;
            uint256 nonce;
            uint256 tokenAmount;
            uint256 tokenGas;
            uint256 validUntilTime;
            bytes data;
        }

        struct DeployForwardRequest {
            address relayHub;
            address from;
            address to;
            address tokenContract;
            address recoverer;
            uint256 value;
            uint256 nonce;
            uint256 tokenAmount;
            uint256 tokenGas;
            uint256 validUntilTime;
            uint256 index;
            bytes data;
        }

        struct RelayRequest {
            ForwardRequest request;
            RelayData relayData;
        }

        struct DeployRequest {
            DeployForwardRequest request;
            RelayData relayData;
        }

        struct RelayManagerData {
            address manager;
            bool currentlyStaked;
            bool registered;
            string url;
        }

        event TransactionRelayed(
            address indexed relayManager,
            address indexed relayWorker,
            bytes32 indexed relayRequestSigHash,
            bytes relayedCallReturnValue
        );

        event TransactionRelayedButRevertedByRecipient(
            address indexed relayManager,
            address indexed relayWorker,
            bytes32 indexed relayRequestSigHash,
            bytes reason
        );

        event RelayServerRegistered(address indexed relayManager, string relayUrl);

        function relayCall(RelayRequest calldata relayRequest, bytes calldata signature)
            external
            returns (bool destinationCallSuccess);

        function deployCall(DeployRequest calldata deployRequest, bytes calldata signature)
            external;

        function getRelayInfo(address relayManager)
            external
            view
            returns (RelayManagerData memory relayManagerData);
    }
}

sol! {
    /// Factory deploying smart wallets at deterministic addresses.
    #[sol(rpc)]
    #[derive(Debug)]
    interface ISmartWalletFactory {
        event Deployed(address indexed addr, uint256 salt);

        /// Returns the next deploy nonce of `from`.
        function nonce(address from) external view returns (uint256);

        function getSmartWalletAddress(address owner, address recoverer, uint256 index)
            external
            view
            returns (address);
    }
}
