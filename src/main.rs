fn main() {
    chatter_guild_lib::run()
}
